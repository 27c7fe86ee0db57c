//! Merge command line, environment and config files into one token stream.
//!
//! Operates on pre-loaded data ([`MergeInput`]) plus a loader callback for
//! config files, so the whole pipeline is testable with synthetic inputs.
//! Steps:
//!
//! 1. Copy the literal command line
//! 2. Append tokens for bound environment variables not already given
//! 3. Locate config files using the tokens so far (a config path may come
//!    from the environment) and append tokens for their settings. The
//!    earliest file claims a key; later files only fill what is still unset
//! 4. Record which options will fall back to their defaults
//!
//! Precedence falls out of the order: a flag already in the token list is
//! never synthesized again.

use tracing::{debug, trace};

use crate::env;
use crate::error::ArgfigError;
use crate::file::ConfigFile;
use crate::option::OptionSpec;
use crate::provenance::{Provenance, ValueSource};
use crate::synth;
use crate::types::{ConfigFormat, DefaultValue};

/// Everything the merge needs besides the config files themselves.
pub struct MergeInput<'a> {
    pub options: &'a [OptionSpec],
    /// The literal command line, without the program name.
    pub args: &'a [String],
    /// Raw environment variable pairs (pass `std::env::vars().collect()` or synthetic data).
    pub env_vars: Vec<(String, String)>,
    pub format: ConfigFormat,
    pub ignore_unknown_config_file_keys: bool,
    pub accumulate_repeated_list_keys: bool,
}

/// The augmented token stream and how it came about.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub tokens: Vec<String>,
    pub provenance: Provenance,
}

/// Run the merge. `load_files` receives the command line plus env-derived
/// tokens and returns config sources in precedence order, earliest first.
pub fn merge(
    input: MergeInput<'_>,
    load_files: impl FnOnce(&[String]) -> Result<Vec<ConfigFile>, ArgfigError>,
) -> Result<Merged, ArgfigError> {
    let mut tokens = input.args.to_vec();
    let mut provenance = Provenance::new();

    // 1: Literal command line
    if !tokens.is_empty() {
        provenance.record(ValueSource::CommandLine, "", None, tokens.clone().into());
    }

    // 2: Environment
    for found in env::env_values(input.options, input.env_vars) {
        if already_on_command_line(&tokens, found.spec.flags().iter().map(String::as_str)) {
            trace!(var = found.var, "Environment variable overridden by command line");
            continue;
        }
        let extra = synth::synthesize(Some(found.spec), found.var, &found.value)?;
        debug!(var = found.var, tokens = ?extra, "Adding environment variable tokens");
        splice_before_terminator(&mut tokens, extra);
        provenance.record(
            ValueSource::EnvironmentVariables,
            found.var,
            Some(found.spec.get_dest()),
            found.value,
        );
    }

    // 3: Config files, earliest first
    let files = load_files(&tokens)?;
    for file in &files {
        let is_list_key = |key: &str| {
            input.accumulate_repeated_list_keys
                && input
                    .options
                    .iter()
                    .any(|o| o.matches_config_key(key) && o.get_arity().is_list())
        };
        let settings = input
            .format
            .parse(&file.source_name, &file.contents, is_list_key)?;

        let source = ValueSource::ConfigFile(file.source_name.clone());
        for (key, value) in settings.iter() {
            let spec = input.options.iter().find(|o| o.matches_config_key(key));
            let claimed = match spec {
                Some(spec) => {
                    already_on_command_line(&tokens, spec.flags().iter().map(String::as_str))
                }
                None if input.ignore_unknown_config_file_keys => {
                    trace!(key, source = %file.source_name, "Ignoring unknown config key");
                    continue;
                }
                None => already_on_command_line(&tokens, [synth::unknown_key_flag(key).as_str()]),
            };
            if claimed {
                trace!(key, source = %file.source_name, "Config key already set, skipping");
                continue;
            }

            let extra = synth::synthesize(spec, key, value)?;
            debug!(key, source = %file.source_name, tokens = ?extra, "Adding config file tokens");
            splice_before_terminator(&mut tokens, extra);
            provenance.record(
                source.clone(),
                key,
                spec.map(OptionSpec::get_dest),
                value.clone(),
            );
        }
    }

    // 4: Defaults, for display only
    for spec in input.options {
        let DefaultValue::Value(default) = spec.get_default() else {
            continue;
        };
        if spec.get_arity().takes_no_value()
            || (spec.is_positional() && spec.is_required())
            || already_on_command_line(&tokens, spec.flags().iter().map(String::as_str))
        {
            continue;
        }
        let key = spec
            .flags()
            .last()
            .map_or(spec.get_dest(), String::as_str);
        provenance.record(
            ValueSource::Defaults,
            key,
            Some(spec.get_dest()),
            default.clone(),
        );
    }

    Ok(Merged { tokens, provenance })
}

/// Whether any of `flags` is already present in `tokens`.
///
/// `--flag=value` counts as `--flag`, and a short flag with its value
/// attached (`-fWIG`, `-f=WIG`) counts as `-f`. Tokens after a literal `--`
/// are positional values and never count.
pub fn already_on_command_line<'a>(
    tokens: &[String],
    flags: impl IntoIterator<Item = &'a str>,
) -> bool {
    let flags: Vec<&str> = flags.into_iter().collect();
    tokens
        .iter()
        .take_while(|t| t.as_str() != "--")
        .filter(|t| t.starts_with('-'))
        .any(|t| {
            let head = t.split_once('=').map_or(t.as_str(), |(head, _)| head);
            if flags.contains(&head) {
                return true;
            }
            !t.starts_with("--") && t.get(..2).is_some_and(|short| flags.contains(&short))
        })
}

/// Append `extra`, keeping a literal `--` and everything after it at the end.
pub fn splice_before_terminator(tokens: &mut Vec<String>, extra: Vec<String>) {
    match tokens.iter().position(|t| t == "--") {
        Some(pos) => {
            tokens.splice(pos..pos, extra);
        }
        None => tokens.extend(extra),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Arity, SettingValue};

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn file(name: &str, contents: &str) -> ConfigFile {
        ConfigFile {
            source_name: name.into(),
            contents: contents.into(),
        }
    }

    fn input<'a>(options: &'a [OptionSpec], args: &'a [String]) -> MergeInput<'a> {
        MergeInput {
            options,
            args,
            env_vars: Vec::new(),
            format: ConfigFormat::Simple,
            ignore_unknown_config_file_keys: false,
            accumulate_repeated_list_keys: false,
        }
    }

    fn run(input: MergeInput<'_>, files: Vec<ConfigFile>) -> Merged {
        merge(input, |_| Ok(files)).unwrap()
    }

    // --- already_on_command_line ---

    #[test]
    fn detects_plain_and_attached_flags() {
        let t = tokens("-f WIG --level=3");
        assert!(already_on_command_line(&t, ["--format", "-f"]));
        assert!(already_on_command_line(&t, ["--level"]));
        assert!(!already_on_command_line(&t, ["--lev"]));
    }

    #[test]
    fn detects_attached_short_values() {
        let t = tokens("-fWIG");
        assert!(already_on_command_line(&t, ["-f", "--format"]));
        assert!(!already_on_command_line(&t, ["-W"]));
        assert!(already_on_command_line(&tokens("-f=WIG"), ["-f"]));
        assert!(!already_on_command_line(&tokens("--fWIG"), ["-f"]));
    }

    #[test]
    fn tokens_after_terminator_ignored() {
        let t = tokens("pos -- --format");
        assert!(!already_on_command_line(&t, ["--format"]));
    }

    #[test]
    fn positional_values_never_match() {
        let t = tokens("format=x");
        assert!(!already_on_command_line(&t, ["format"]));
    }

    #[test]
    fn splice_keeps_terminator_last() {
        let mut t = tokens("a -- b");
        splice_before_terminator(&mut t, tokens("--x 1"));
        assert_eq!(t, tokens("a --x 1 -- b"));

        let mut t = tokens("a");
        splice_before_terminator(&mut t, tokens("--x"));
        assert_eq!(t, tokens("a --x"));
    }

    // --- precedence ---

    fn format_options() -> Vec<OptionSpec> {
        vec![
            OptionSpec::new(["-f", "--format"])
                .env_var("OUTPUT_FORMAT")
                .default_value("BED"),
        ]
    }

    #[test]
    fn command_line_beats_everything() {
        let options = format_options();
        let args = tokens("--format WIG");
        let mut inp = input(&options, &args);
        inp.env_vars = vars(&[("OUTPUT_FORMAT", "R")]);
        let merged = run(inp, vec![file("a.ini", "format = MAF\n")]);

        assert_eq!(merged.tokens, tokens("--format WIG"));
        assert_eq!(merged.provenance.sources().count(), 1);
    }

    #[test]
    fn attached_short_value_beats_env_and_config() {
        let options = format_options();
        let args = tokens("-fWIG");
        let mut inp = input(&options, &args);
        inp.env_vars = vars(&[("OUTPUT_FORMAT", "R")]);
        let merged = run(inp, vec![file("a.ini", "format = MAF\n")]);
        assert_eq!(merged.tokens, tokens("-fWIG"));
    }

    #[test]
    fn environment_beats_config() {
        let options = format_options();
        let mut inp = input(&options, &[]);
        inp.env_vars = vars(&[("OUTPUT_FORMAT", "R")]);
        let merged = run(inp, vec![file("a.ini", "format = MAF\n")]);

        assert_eq!(merged.tokens, tokens("--format R"));
        assert_eq!(
            merged.provenance.source_of("format"),
            Some(&ValueSource::EnvironmentVariables)
        );
    }

    #[test]
    fn earliest_config_file_wins() {
        let options = format_options();
        let merged = run(
            input(&options, &[]),
            vec![file("a.ini", "format = MAF\n"), file("b.ini", "format = GFF\n")],
        );
        assert_eq!(merged.tokens, tokens("--format MAF"));
        assert_eq!(
            merged.provenance.source_of("format"),
            Some(&ValueSource::ConfigFile("a.ini".into()))
        );
        assert!(merged.provenance.entries(&ValueSource::ConfigFile("b.ini".into())).is_empty());
    }

    #[test]
    fn later_file_fills_unset_keys() {
        let options = vec![OptionSpec::new(["--a"]), OptionSpec::new(["--b"])];
        let merged = run(
            input(&options, &[]),
            vec![file("first", "a = 1\n"), file("second", "a = 2\nb = 3\n")],
        );
        assert_eq!(merged.tokens, tokens("--a 1 --b 3"));
    }

    #[test]
    fn defaults_recorded_when_nothing_else_sets_option() {
        let options = format_options();
        let merged = run(input(&options, &[]), vec![]);
        assert!(merged.tokens.is_empty());
        let defaults = merged.provenance.entries(&ValueSource::Defaults);
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].key, "--format");
        assert_eq!(defaults[0].value, SettingValue::from("BED"));
    }

    #[test]
    fn defaults_skip_flags_and_required_positionals() {
        let options = vec![
            OptionSpec::new(["--verbose"]).arity(Arity::Flag).default_value("true"),
            OptionSpec::positional("input").default_value("x"),
            OptionSpec::positional("output").required(false).default_value("out"),
            OptionSpec::new(["--hidden"]).suppress_default(),
        ];
        let merged = run(input(&options, &[]), vec![]);
        let keys: Vec<&str> = merged
            .provenance
            .entries(&ValueSource::Defaults)
            .iter()
            .map(|e| e.key.as_str())
            .collect();
        assert_eq!(keys, vec!["output"]);
    }

    // --- environment ---

    #[test]
    fn env_tokens_spliced_before_terminator() {
        let options = vec![OptionSpec::new(["--name"]).env_var("NAME")];
        let args = tokens("-- --name");
        let mut inp = input(&options, &args);
        inp.env_vars = vars(&[("NAME", "x")]);
        let merged = run(inp, vec![]);
        assert_eq!(merged.tokens, tokens("--name x -- --name"));
    }

    #[test]
    fn env_conflict_is_error() {
        let options = vec![
            OptionSpec::new(["--verbose"])
                .arity(Arity::Flag)
                .env_var("VERBOSE"),
        ];
        let mut inp = input(&options, &[]);
        inp.env_vars = vars(&[("VERBOSE", "bla")]);
        let err = merge(inp, |_| Ok(vec![])).unwrap_err();
        assert!(matches!(err, ArgfigError::UnexpectedFlagValue { ref key, .. } if key == "VERBOSE"));
    }

    #[test]
    fn loader_sees_env_tokens() {
        let options = vec![
            OptionSpec::new(["--config"]).config_path().env_var("CFG"),
        ];
        let mut inp = input(&options, &[]);
        inp.env_vars = vars(&[("CFG", "x.ini")]);
        let mut seen = Vec::new();
        merge(inp, |t| {
            seen = t.to_vec();
            Ok(vec![])
        })
        .unwrap();
        assert_eq!(seen, tokens("--config x.ini"));
    }

    // --- config files ---

    #[test]
    fn list_setting_expands_to_pairs() {
        let options = vec![OptionSpec::new(["-l", "--list"]).arity(Arity::ListAppend)];
        let merged = run(input(&options, &[]), vec![file("f", "list = [a, b, c]\n")]);
        assert_eq!(merged.tokens, tokens("--list a --list b --list c"));
    }

    #[test]
    fn unknown_keys_become_attached_flags() {
        let options = vec![OptionSpec::new(["--a"])];
        let merged = run(
            input(&options, &[]),
            vec![file("f", "bogus = two words\n"), file("g", "bogus = 1\n")],
        );
        assert_eq!(merged.tokens, vec!["--bogus=two words".to_string()]);
        let entries = merged.provenance.entries(&ValueSource::ConfigFile("f".into()));
        assert_eq!(entries[0].dest, None);
    }

    #[test]
    fn unknown_keys_ignored_when_requested() {
        let options = vec![OptionSpec::new(["--a"])];
        let mut inp = input(&options, &[]);
        inp.ignore_unknown_config_file_keys = true;
        let merged = run(inp, vec![file("f", "bogus = 1\na = 2\n")]);
        assert_eq!(merged.tokens, tokens("--a 2"));
        assert_eq!(
            merged
                .provenance
                .entries(&ValueSource::ConfigFile("f".into()))
                .len(),
            1
        );
    }

    #[test]
    fn repeated_list_key_accumulates_when_enabled() {
        let options = vec![
            OptionSpec::new(["-z", "--arg-z"]).arity(Arity::ListAppend),
            OptionSpec::new(["--y"]),
        ];
        let text = "arg-z = 30\narg-z = 40\ny = 1\ny = 2\n";

        let merged = run(input(&options, &[]), vec![file("f", text)]);
        assert_eq!(merged.tokens, tokens("--arg-z 40 --y 2"));

        let mut inp = input(&options, &[]);
        inp.accumulate_repeated_list_keys = true;
        let merged = run(inp, vec![file("f", text)]);
        assert_eq!(merged.tokens, tokens("--arg-z 30 --arg-z 40 --y 2"));
    }

    #[test]
    fn syntax_error_propagates() {
        let options = vec![OptionSpec::new(["--a"])];
        let err = merge(input(&options, &[]), |_| Ok(vec![file("bad.ini", "= 1\n")])).unwrap_err();
        assert!(matches!(err, ArgfigError::ConfigSyntax { line: 1, .. }));
    }
}
