//! Config file location and loading.
//!
//! Two kinds of files are read, in this order:
//!
//! - **Default files** configured on the builder. Each path is `~`-expanded
//!   and kept only if it exists. Missing defaults are skipped silently; a
//!   default that exists but cannot be read is skipped with a warning.
//! - **User files** named on the command line through config-path options.
//!   These must be readable: any failure is an error naming the path.
//!
//! Earlier files take precedence over later ones when the same key appears in
//! several of them (see [`merge`](crate::merge)).

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::engine;
use crate::error::ArgfigError;
use crate::option::OptionSpec;

/// Name given to config contents passed directly to a parse call.
pub const INLINE_SOURCE_NAME: &str = "method arg";

/// The text of one config source, read fully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Shown in provenance output and error messages.
    pub source_name: String,
    pub contents: String,
}

/// Expand a leading `~` to the user's home directory.
///
/// Paths without `~`, and `~user` forms, are returned unchanged. So is
/// everything when no home directory can be determined.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => &rest[1..],
        _ => return PathBuf::from(path),
    };
    match directories::UserDirs::new() {
        Some(user) if rest.is_empty() => user.home_dir().to_path_buf(),
        Some(user) => user.home_dir().join(rest),
        None => PathBuf::from(path),
    }
}

/// Read every default config file that exists, in order.
pub fn load_default_files(default_paths: &[String]) -> Vec<ConfigFile> {
    let mut files = Vec::new();
    for raw in default_paths {
        let path = expand_home(raw);
        if !path.is_file() {
            debug!(path = %path.display(), "Default config file not found, skipping");
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                debug!(path = %path.display(), "Loaded default config file");
                files.push(ConfigFile {
                    source_name: path.display().to_string(),
                    contents,
                });
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unable to read default config file, skipping");
            }
        }
    }
    files
}

/// Read the config files named on the command line through config-path options.
///
/// Options are visited in declaration order; paths for each option come in
/// command-line order.
pub fn load_user_files(
    options: &[OptionSpec],
    tokens: &[String],
) -> Result<Vec<ConfigFile>, ArgfigError> {
    let mut files = Vec::new();
    for spec in options.iter().filter(|o| o.is_config_path()) {
        for raw in engine::recognize(spec, tokens)? {
            let path = expand_home(&raw);
            files.push(read_user_file(&path)?);
        }
    }
    Ok(files)
}

/// Default files first, then user files.
pub fn locate_config_files(
    default_paths: &[String],
    options: &[OptionSpec],
    tokens: &[String],
) -> Result<Vec<ConfigFile>, ArgfigError> {
    let mut files = load_default_files(default_paths);
    files.extend(load_user_files(options, tokens)?);
    Ok(files)
}

fn read_user_file(path: &Path) -> Result<ConfigFile, ArgfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ArgfigError::ConfigFileOpen {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), "Loaded config file from command line");
    Ok(ConfigFile {
        source_name: path.display().to_string(),
        contents,
    })
}
