use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArgfigError {
    #[error("Unexpected line {line} in {source_name}: {content}")]
    ConfigSyntax {
        source_name: String,
        line: usize,
        content: String,
    },

    #[error("Unable to open config file: {path}. Error: {source}")]
    ConfigFileOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{key} set to 'True' rather than a value")]
    TrueForValueOption { key: String },

    #[error("{key} can't be set to a list '{value}' unless its action type is changed to 'append'")]
    ListForNonList { key: String, value: String },

    #[error("{key} is a flag but is being set to '{value}'")]
    ValueForFlag { key: String, value: String },

    #[error(
        "Unexpected value for {key}: '{value}'. Expecting 'true', 'false', 'yes', 'no', 'on', 'off', '1', '0'"
    )]
    UnexpectedFlagValue { key: String, value: String },

    #[error("Invalid option '{option}': {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("Couldn't open {path} for writing: {source}")]
    WriteConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "Construction options can only be passed the first time; parser '{name}' already exists"
    )]
    RegistryConflict { name: String },

    #[error(transparent)]
    Engine(#[from] clap::Error),
}

impl ArgfigError {
    /// Process exit code matching the convention of the underlying flag engine.
    pub fn exit_code(&self) -> i32 {
        match self {
            ArgfigError::Engine(e) => e.exit_code(),
            _ => 2,
        }
    }
}
