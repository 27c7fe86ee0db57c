use std::path::PathBuf;

use clap::error::ErrorKind;
use tracing::debug;

use crate::engine::{self, CommandSettings};
use crate::env;
use crate::error::ArgfigError;
use crate::file::{self, ConfigFile, INLINE_SOURCE_NAME};
use crate::merge::{self, MergeInput};
use crate::option::OptionSpec;
use crate::outcome::{ParseOutcome, ParsedArgs};
use crate::persist;
use crate::provenance::Provenance;
use crate::types::{ConfigFormat, SettingValue};

const CONFIG_PATH_HELP: &str = "config file path";
const WRITE_OUT_HELP: &str = "takes the current command line args and writes them out to a \
                              config file at the given path, then exits";

/// Builder for an [`ArgParser`].
///
/// Controls three things (see the [crate docs](crate) for the full picture):
///
/// - **Config files**: [`default_config_files()`](Self::default_config_files) and
///   [`config_path_flags()`](Self::config_path_flags), where settings are read from.
/// - **Environment**: [`auto_env_var_prefix()`](Self::auto_env_var_prefix), which
///   options get a variable without naming one.
/// - **Write-out**: [`write_out_config_flags()`](Self::write_out_config_flags), where
///   the resolved settings can be saved.
///
/// Builders compare equal when they would build the same parser, which the
/// [`registry`](crate::registry) uses to detect conflicting construction options.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgParserBuilder {
    prog: Option<String>,
    description: Option<String>,
    epilog: Option<String>,
    default_config_files: Vec<String>,
    ignore_unknown_config_file_keys: bool,
    config_format: ConfigFormat,
    auto_env_var_prefix: Option<String>,
    add_config_file_help: bool,
    add_env_var_help: bool,
    add_help: bool,
    accumulate_repeated_list_keys: bool,
    config_path_flags: Vec<String>,
    config_path_required: bool,
    config_path_help: String,
    write_out_config_flags: Vec<String>,
    write_out_config_help: String,
}

impl Default for ArgParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArgParserBuilder {
    pub fn new() -> Self {
        Self {
            prog: None,
            description: None,
            epilog: None,
            default_config_files: Vec::new(),
            ignore_unknown_config_file_keys: false,
            config_format: ConfigFormat::default(),
            auto_env_var_prefix: None,
            add_config_file_help: true,
            add_env_var_help: true,
            add_help: true,
            accumulate_repeated_list_keys: false,
            config_path_flags: Vec::new(),
            config_path_required: false,
            config_path_help: CONFIG_PATH_HELP.to_string(),
            write_out_config_flags: Vec::new(),
            write_out_config_help: WRITE_OUT_HELP.to_string(),
        }
    }

    /// Program name shown in usage and help (default: the executable name).
    pub fn prog(mut self, name: &str) -> Self {
        self.prog = Some(name.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    /// Text shown after the option list in help.
    pub fn epilog(mut self, text: &str) -> Self {
        self.epilog = Some(text.to_string());
        self
    }

    /// Config files read on every parse, `~`-expanded.
    ///
    /// Listed in **priority-descending** order: when two files set the same
    /// key, the earlier file wins. Files named on the command line come after
    /// all of these. Missing files are silently skipped.
    pub fn default_config_files<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_config_files = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Drop config file keys that no option claims instead of passing them on
    /// as unknown arguments (default: `false`).
    pub fn ignore_unknown_config_file_keys(mut self, ignore: bool) -> Self {
        self.ignore_unknown_config_file_keys = ignore;
        self
    }

    /// Syntax of config files and of written-out config (default: [`ConfigFormat::Simple`]).
    pub fn config_format(mut self, format: ConfigFormat) -> Self {
        self.config_format = format;
        self
    }

    /// Bind every option with a long flag to an environment variable named
    /// `PREFIX` + the upper-cased flag (`--out-dir` → `PREFIX_OUT_DIR` for
    /// prefix `PREFIX_`). Options that name their own variable keep it.
    pub fn auto_env_var_prefix(mut self, prefix: &str) -> Self {
        self.auto_env_var_prefix = Some(prefix.to_string());
        self
    }

    /// Describe config file support in help (default: `true`).
    pub fn add_config_file_help(mut self, add: bool) -> Self {
        self.add_config_file_help = add;
        self
    }

    /// Show `[env var: NAME]` in option help (default: `true`).
    pub fn add_env_var_help(mut self, add: bool) -> Self {
        self.add_env_var_help = add;
        self
    }

    /// Provide `-h/--help` (default: `true`).
    pub fn add_help(mut self, add: bool) -> Self {
        self.add_help = add;
        self
    }

    /// When a list option's key appears on several lines of one config file,
    /// collect every line instead of keeping the last (default: `false`).
    pub fn accumulate_repeated_list_keys(mut self, accumulate: bool) -> Self {
        self.accumulate_repeated_list_keys = accumulate;
        self
    }

    /// Register an option, such as `["-c", "--config"]`, naming a config file to read.
    pub fn config_path_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config_path_flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn config_path_required(mut self, required: bool) -> Self {
        self.config_path_required = required;
        self
    }

    pub fn config_path_help(mut self, help: &str) -> Self {
        self.config_path_help = help.to_string();
        self
    }

    /// Register an option that writes the resolved settings to a config file
    /// instead of returning them.
    pub fn write_out_config_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write_out_config_flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn write_out_config_help(mut self, help: &str) -> Self {
        self.write_out_config_help = help.to_string();
        self
    }

    /// Resolve the effective program name.
    fn effective_prog(&self) -> String {
        if let Some(prog) = &self.prog {
            return prog.clone();
        }
        std::env::args_os()
            .next()
            .and_then(|arg0| {
                std::path::Path::new(&arg0)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "program".to_string())
    }

    pub fn build(self) -> Result<ArgParser, ArgfigError> {
        let mut parser = ArgParser {
            settings: self.clone(),
            options: Vec::new(),
            provenance: Provenance::new(),
        };
        if !self.config_path_flags.is_empty() {
            parser.add_option(
                OptionSpec::new(self.config_path_flags)
                    .config_path()
                    .required(self.config_path_required)
                    .help(&self.config_path_help),
            )?;
        }
        if !self.write_out_config_flags.is_empty() {
            parser.add_option(
                OptionSpec::new(self.write_out_config_flags)
                    .config_output_path()
                    .help(&self.write_out_config_help)
                    .value_name("CONFIG_OUTPUT_PATH"),
            )?;
        }
        Ok(parser)
    }
}

/// Arguments and environment for a single parse call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseInput {
    args: Vec<String>,
    env_vars: Vec<(String, String)>,
    config_contents: Option<String>,
}

impl ParseInput {
    /// Explicit arguments (without the program name) and an empty environment.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// The process arguments and environment.
    pub fn from_env() -> Self {
        let args = std::env::args_os()
            .skip(1)
            .map(|a| a.to_string_lossy().into_owned());
        Self::new(args).env_vars(std::env::vars_os().map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        }))
    }

    /// Replace the environment seen by the parse.
    pub fn env_vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env_vars = vars.into_iter().collect();
        self
    }

    /// Use `contents` as the only config source, in place of any config files.
    pub fn config_contents(mut self, contents: &str) -> Self {
        self.config_contents = Some(contents.to_string());
        self
    }
}

/// Command-line parser with config file and environment fallbacks.
#[derive(Debug, Clone)]
pub struct ArgParser {
    settings: ArgParserBuilder,
    options: Vec<OptionSpec>,
    provenance: Provenance,
}

impl ArgParser {
    pub fn builder() -> ArgParserBuilder {
        ArgParserBuilder::new()
    }

    /// Register an option. Fails when the option breaks a registration rule
    /// or clashes with an option already registered.
    pub fn add_option(&mut self, mut spec: OptionSpec) -> Result<&mut Self, ArgfigError> {
        spec.validate()?;

        let conflict = |reason: String| ArgfigError::InvalidOption {
            option: spec.display_name(),
            reason,
        };
        if self
            .options
            .iter()
            .any(|o| o.get_dest() == spec.get_dest())
        {
            return Err(conflict(format!(
                "identifier '{}' is already used",
                spec.get_dest()
            )));
        }
        let reserved: &[&str] = if self.settings.add_help {
            &["-h", "--help"]
        } else {
            &[]
        };
        for flag in spec.flags() {
            if reserved.contains(&flag.as_str())
                || self.options.iter().any(|o| o.flags().contains(flag))
            {
                return Err(conflict(format!("conflicting option string: {flag}")));
            }
        }

        if spec.get_env_var().is_none()
            && let Some(prefix) = &self.settings.auto_env_var_prefix
            && let Some(name) = env::auto_env_var_name(prefix, &spec)
        {
            spec.set_env_var(name);
        }

        debug!(option = %spec.display_name(), dest = spec.get_dest(), "Registered option");
        self.options.push(spec);
        Ok(self)
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// Parse, treating any unrecognized token as an error.
    pub fn parse(&mut self, input: ParseInput) -> Result<ParseOutcome, ArgfigError> {
        self.run(input, true)
    }

    /// Parse, returning unrecognized tokens in [`ParsedArgs::unknown`].
    pub fn parse_known(&mut self, input: ParseInput) -> Result<ParseOutcome, ArgfigError> {
        self.run(input, false)
    }

    /// Parse the process arguments and environment, exiting on failure.
    ///
    /// Help requests and errors are printed by clap with the usual exit
    /// codes. A config write-out prints where it wrote and exits with 0.
    pub fn parse_or_exit(&mut self) -> ParsedArgs {
        match self.parse(ParseInput::from_env()) {
            Ok(ParseOutcome::Bound(args)) => args,
            Ok(outcome @ ParseOutcome::WroteConfig(_)) => {
                println!("{outcome}");
                std::process::exit(0);
            }
            Err(ArgfigError::Engine(e)) => e.exit(),
            Err(e) => self
                .command()
                .error(ErrorKind::InvalidValue, e.to_string())
                .exit(),
        }
    }

    /// Provenance of the last parse, as text.
    pub fn format_values(&self) -> String {
        self.provenance.to_string()
    }

    /// Provenance of the last parse.
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn format_help(&self) -> String {
        self.command().render_help().to_string()
    }

    pub fn format_usage(&self) -> String {
        self.command().render_usage().to_string()
    }

    fn command(&self) -> clap::Command {
        let prog = self.settings.effective_prog();
        let about = match (&self.settings.description, self.config_help_message()) {
            (Some(d), Some(m)) => Some(format!("{d} {m}")),
            (d, m) => d.clone().or(m),
        };
        let settings = CommandSettings {
            prog: &prog,
            about,
            epilog: self.settings.epilog.as_deref(),
            add_help: self.settings.add_help,
            env_var_help: self.settings.add_env_var_help,
        };
        engine::build_command(&settings, &self.options)
    }

    /// The paragraph describing config files and precedence, if any applies.
    fn config_help_message(&self) -> Option<String> {
        let mut msg = String::new();
        let mut sources = vec!["defaults"];

        let mut added_config_help = false;
        if self.settings.add_config_file_help {
            let first_settable = self
                .options
                .iter()
                .filter(|o| !o.is_config_path() && !o.is_config_output_path())
                .find_map(|o| o.long_flags().next());
            let path_flags: Vec<&str> = self
                .options
                .iter()
                .filter(|o| o.is_config_path())
                .filter_map(|o| o.flags().first().map(String::as_str))
                .collect();

            if let Some(example) = first_settable
                && (!self.settings.default_config_files.is_empty() || !path_flags.is_empty())
            {
                added_config_help = true;
                msg.push_str(&format!(
                    "Args that start with '--' (eg. {example}) can also be set in a config file"
                ));
                let mut places = self.settings.default_config_files.clone();
                if !path_flags.is_empty() {
                    places.push(format!("specified via {}", path_flags.join(" or ")));
                }
                msg.push_str(&format!(" ({}). ", places.join(" or ")));
                msg.push_str(self.settings.config_format.syntax_description());
                sources.insert(0, "config file values");
            }
        }

        let added_env_help =
            self.settings.add_env_var_help && self.options.iter().any(|o| o.get_env_var().is_some());
        if added_env_help {
            sources.insert(0, "environment variables");
        }

        if added_config_help || added_env_help {
            if !msg.is_empty() {
                msg.push(' ');
            }
            msg.push_str(&format!(
                "If an arg is specified in more than one place, then commandline values override {}.",
                sources.join(" which override ")
            ));
        }
        (!msg.is_empty()).then_some(msg)
    }

    fn run(&mut self, input: ParseInput, strict: bool) -> Result<ParseOutcome, ArgfigError> {
        let ParseInput {
            args,
            env_vars,
            config_contents,
        } = input;

        let defaults = &self.settings.default_config_files;
        let options = &self.options;
        let merged = merge::merge(
            MergeInput {
                options,
                args: &args,
                env_vars,
                format: self.settings.config_format,
                ignore_unknown_config_file_keys: self.settings.ignore_unknown_config_file_keys,
                accumulate_repeated_list_keys: self.settings.accumulate_repeated_list_keys,
            },
            |tokens| match config_contents {
                Some(contents) => Ok(vec![ConfigFile {
                    source_name: INLINE_SOURCE_NAME.to_string(),
                    contents,
                }]),
                None => file::locate_config_files(defaults, options, tokens),
            },
        )?;
        debug!(tokens = ?merged.tokens, "Resolved command line");
        self.provenance = merged.provenance;

        let mut cmd = self.command();
        let (matches, unknown) = engine::parse_known(&mut cmd, &merged.tokens)?;
        let (matches, unknown) = if strict && !unknown.is_empty() {
            (engine::parse_strict(&mut cmd, &merged.tokens)?, Vec::new())
        } else {
            (matches, unknown)
        };
        // Positionals cannot be checked for presence before clap has run.
        self.provenance.drop_defaults_where(|dest| {
            matches.value_source(dest) == Some(clap::parser::ValueSource::CommandLine)
        });
        let parsed = ParsedArgs::new(matches, self.options.clone(), unknown);

        let output_paths: Vec<PathBuf> = self
            .options
            .iter()
            .filter(|o| o.is_config_output_path())
            .filter_map(|o| match parsed.value(o.get_dest()) {
                Some(SettingValue::Scalar(path)) => Some(PathBuf::from(path)),
                _ => None,
            })
            .collect();
        if output_paths.is_empty() {
            return Ok(ParseOutcome::Bound(parsed));
        }

        let items = persist::collect_items(&self.options, &self.provenance, &parsed, &args);
        let contents = self.settings.config_format.serialize(&items);
        persist::write_config_files(&output_paths, &contents)?;
        Ok(ParseOutcome::WroteConfig(output_paths))
    }
}
