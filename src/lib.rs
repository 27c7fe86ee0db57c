//! Command-line parsing with config file and environment variable fallbacks.
//! Declare your options once, and each can be set from any of four places.
//!
//! Argfig sits in front of [clap](https://docs.rs/clap). It reads config
//! files and environment variables, turns what they set into extra
//! command-line tokens, and lets clap parse the result. Every option is
//! validated, typed and documented by clap exactly as if the user had typed
//! it.
//!
//! ```ignore
//! let mut parser = ArgParser::builder()
//!     .default_config_files(["/etc/myapp.ini", "~/.myapp.ini"])
//!     .config_path_flags(["-c", "--config"])
//!     .auto_env_var_prefix("MYAPP_")
//!     .build()?;
//! parser.add_option(OptionSpec::new(["-f", "--format"]).default_value("BED"))?;
//!
//! let args = parser.parse_or_exit();
//! println!("{}", args.get_str("format").unwrap_or_default());
//! ```
//!
//! With that setup, `--format` can come from the command line, from
//! `MYAPP_FORMAT`, from `format = WIG` in either default file or in a file
//! named with `-c`, or from its default.
//!
//! # Precedence
//!
//! ```text
//! Defaults              OptionSpec::default_value()
//!        ↑ overridden by
//! Config files          default files in order, then -c files; earliest wins
//!        ↑ overridden by
//! Environment vars      explicit name, or PREFIX + FLAG
//!        ↑ overridden by
//! Command line
//! ```
//!
//! An option is taken from the first place that sets it. Note the config
//! file order: unlike most layered config systems, the **earliest** file
//! listed wins, so list system-wide mandatory settings first.
//!
//! # Option descriptors
//!
//! An [`OptionSpec`] carries everything about one option: its flags, its
//! [`Arity`] (single value, list, flag, counter...), [`ValueType`], default,
//! choices, help, and its role. Two roles are special:
//!
//! - **[`config_path()`](OptionSpec::config_path)** names config files to
//!   read. Usually registered via
//!   [`config_path_flags()`](ArgParserBuilder::config_path_flags).
//! - **[`config_output_path()`](OptionSpec::config_output_path)** writes the
//!   resolved settings to a file instead of returning them; the parse
//!   returns [`ParseOutcome::WroteConfig`].
//!
//! # Config files
//!
//! The default syntax is line-oriented `key = value` (or `key: value`, or
//! `key value`), with `#`/`;` comments, and `[a, b]` for lists. A bare `key`
//! means `key = true`. Keys are long flags without their dashes:
//!
//! ```text
//! # ~/.myapp.ini
//! format = WIG
//! verbose = true
//! tags = [a, b, c]
//! ```
//!
//! With the `toml` feature (on by default) [`ConfigFormat::Toml`] selects
//! TOML instead.
//!
//! Keys no option claims are passed on as `--key=value` tokens, so a strict
//! [`parse`](ArgParser::parse) rejects them the way clap rejects an unknown
//! flag, and [`parse_known`](ArgParser::parse_known) returns them in
//! [`ParsedArgs::unknown`]. Turn on
//! [`ignore_unknown_config_file_keys`](ArgParserBuilder::ignore_unknown_config_file_keys)
//! to drop them instead.
//!
//! # Inspecting where values came from
//!
//! After a parse, [`format_values()`](ArgParser::format_values) reports each
//! source and what it set:
//!
//! ```text
//! Command Line Args:   --format WIG
//! Environment Variables:
//!   MYAPP_LEVEL:       3
//! Config File (/home/me/.myapp.ini):
//!   tags:              [a, b, c]
//! Defaults:
//!   --threads:         4
//! ```
//!
//! # Shared parsers
//!
//! The [`registry`] module keeps named parsers for the whole process, so
//! separate parts of a program can add options to the same parser.
//!
//! # Error handling
//!
//! All fallible operations return [`ArgfigError`]. Grammar errors, help and
//! usage requests come from clap unchanged in [`ArgfigError::Engine`];
//! [`parse_or_exit()`](ArgParser::parse_or_exit) prints them and exits the
//! way a plain clap program would.

pub mod error;
pub mod registry;
pub mod types;

mod builder;
mod engine;
mod env;
mod file;
mod merge;
mod option;
mod outcome;
mod persist;
mod provenance;
mod synth;
mod syntax;
#[cfg(feature = "toml")]
mod toml_format;

#[cfg(test)]
mod fixtures;

pub use builder::{ArgParser, ArgParserBuilder, ParseInput};
pub use error::ArgfigError;
pub use option::OptionSpec;
pub use outcome::{ParseOutcome, ParsedArgs};
pub use provenance::{Provenance, ProvenanceEntry, ValueSource};
pub use registry::{DEFAULT_PARSER_NAME, SharedParser, get_parser, init_parser};
pub use syntax::ConfigFileParser;
#[cfg(feature = "toml")]
pub use toml_format::TomlConfigFileParser;
pub use types::{Arity, ConfigFormat, DefaultValue, SettingValue, Settings, ValueType};
