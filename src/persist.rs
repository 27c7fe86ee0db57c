//! Write the resolved settings back out as a config file.
//!
//! When a config-output option has a value, the parse collects one item per
//! config-settable option from the provenance record, renders them in the
//! selected config syntax, and writes the result to every requested path.
//! All output files are opened before any is written.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use crate::error::ArgfigError;
use crate::merge::already_on_command_line;
use crate::option::OptionSpec;
use crate::outcome::ParsedArgs;
use crate::provenance::{Provenance, ValueSource};
use crate::types::{Arity, SettingValue, Settings};

/// Gather config-file items from the sources that set them.
///
/// Sources are visited in provenance order and a later source replaces the
/// value an earlier one gave for the same key. Command-line, environment and
/// default values are written as bound after parsing; config file values are
/// copied as written. Config-path and config-output options never appear.
pub fn collect_items(
    options: &[OptionSpec],
    provenance: &Provenance,
    parsed: &ParsedArgs,
    args: &[String],
) -> Settings {
    let writable = |spec: &&OptionSpec| {
        !spec.is_positional()
            && !spec.is_config_path()
            && !spec.is_config_output_path()
            && !spec.config_keys().is_empty()
    };
    let by_dest = |dest: Option<&str>| {
        dest.and_then(|d| options.iter().find(|o| o.get_dest() == d))
            .filter(writable)
    };

    let mut items = Settings::new();
    for (source, entries) in provenance.sources() {
        match source {
            ValueSource::CommandLine => {
                for spec in options.iter().filter(writable) {
                    if !already_on_command_line(args, spec.flags().iter().map(String::as_str)) {
                        continue;
                    }
                    insert_bound(&mut items, spec, parsed);
                }
            }
            ValueSource::EnvironmentVariables | ValueSource::Defaults => {
                for entry in entries {
                    if let Some(spec) = by_dest(entry.dest.as_deref()) {
                        insert_bound(&mut items, spec, parsed);
                    }
                }
            }
            ValueSource::ConfigFile(_) => {
                for entry in entries {
                    let excluded = entry
                        .dest
                        .as_deref()
                        .and_then(|d| options.iter().find(|o| o.get_dest() == d))
                        .is_some_and(|o| o.is_config_path() || o.is_config_output_path());
                    if !excluded {
                        items.insert(entry.key.as_str(), entry.value.clone());
                    }
                }
            }
        }
    }
    items
}

fn insert_bound(items: &mut Settings, spec: &OptionSpec, parsed: &ParsedArgs) {
    let (Some(key), Some(value)) = (spec.config_keys().first().copied(), parsed.value(spec.get_dest()))
    else {
        return;
    };
    if spec.get_arity() != Arity::FlagFalse {
        items.insert(key, value);
        return;
    }
    // A store-false option is written as its flag being present.
    if value == SettingValue::from("false") {
        items.insert(key, SettingValue::from("true"));
    }
}

/// Write `contents` to every path, opening all of them first.
pub fn write_config_files(paths: &[PathBuf], contents: &str) -> Result<(), ArgfigError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = File::create(path).map_err(|e| ArgfigError::WriteConfig {
            path: path.clone(),
            source: e,
        })?;
        files.push((path, file));
    }

    for (path, mut file) in files {
        file.write_all(contents.as_bytes())
            .map_err(|e| ArgfigError::WriteConfig {
                path: path.clone(),
                source: e,
            })?;
        debug!(path = %path.display(), "Wrote config file");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CommandSettings, build_command, parse_known};
    use crate::file::ConfigFile;
    use crate::merge::{MergeInput, merge};
    use crate::types::ConfigFormat;
    use std::fs;
    use tempfile::TempDir;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    /// Run the merge and bind, returning what the writer would collect.
    fn items(
        options: Vec<OptionSpec>,
        args: &str,
        env: &[(&str, &str)],
        files: Vec<ConfigFile>,
    ) -> Settings {
        let args = tokens(args);
        let merged = merge(
            MergeInput {
                options: &options,
                args: &args,
                env_vars: env
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                format: ConfigFormat::Simple,
                ignore_unknown_config_file_keys: false,
                accumulate_repeated_list_keys: false,
            },
            |_| Ok(files),
        )
        .unwrap();
        let settings = CommandSettings {
            prog: "test",
            ..Default::default()
        };
        let mut cmd = build_command(&settings, &options);
        let (matches, unknown) = parse_known(&mut cmd, &merged.tokens).unwrap();
        let parsed = ParsedArgs::new(matches, options.clone(), unknown);
        collect_items(&options, &merged.provenance, &parsed, &args)
    }

    fn write_out_options() -> Vec<OptionSpec> {
        vec![
            OptionSpec::new(["--config-file-settable-arg"]).arity(Arity::Scalar),
            OptionSpec::new(["--config-file-settable-flag"]).arity(Arity::Flag),
            OptionSpec::new(["-l", "--config-file-settable-list"]).arity(Arity::ListAppend),
            OptionSpec::new(["--scalar-with-default"]).default_value("10"),
            OptionSpec::new(["--scalar-without-default"]),
            OptionSpec::new(["-c", "--config"]).config_path(),
            OptionSpec::new(["-w", "--write-out-config-file"]).config_output_path(),
        ]
    }

    #[test]
    fn command_line_and_defaults_collected() {
        let items = items(
            write_out_options(),
            "--config-file-settable-arg 1 --config-file-settable-flag -l a -l b -w out.ini",
            &[],
            vec![],
        );
        let serialized = ConfigFormat::Simple.serialize(&items);
        assert_eq!(
            serialized,
            "config-file-settable-arg = 1\n\
             config-file-settable-flag = true\n\
             config-file-settable-list = [a, b]\n\
             scalar-with-default = 10\n"
        );
    }

    #[test]
    fn env_values_written_as_bound() {
        let options = vec![OptionSpec::new(["--level"]).env_var("LEVEL")];
        let items = items(options, "", &[("LEVEL", "4")], vec![]);
        assert_eq!(items.get("level"), Some(&SettingValue::from("4")));
    }

    #[test]
    fn config_file_values_copied_raw() {
        let options = vec![
            OptionSpec::new(["--name"]),
            OptionSpec::new(["-c", "--config"]).config_path(),
        ];
        let files = vec![ConfigFile {
            source_name: "a.ini".into(),
            contents: "name = x\nbogus = [p, q]\nconfig = other.ini\n".into(),
        }];
        let items = items(options, "", &[], files);
        assert_eq!(items.get("name"), Some(&SettingValue::from("x")));
        assert_eq!(
            items.get("bogus"),
            Some(&SettingValue::List(vec!["p".into(), "q".into()]))
        );
        assert!(items.get("config").is_none());
    }

    #[test]
    fn store_false_written_as_present_flag() {
        let options = vec![
            OptionSpec::new(["--no-cache"])
                .dest("cache")
                .arity(Arity::FlagFalse),
            OptionSpec::new(["--no-color"])
                .dest("color")
                .arity(Arity::FlagFalse)
                .env_var("NO_COLOR"),
        ];
        let items = items(options, "--no-cache", &[("NO_COLOR", "false")], vec![]);
        assert_eq!(items.get("no-cache"), Some(&SettingValue::from("true")));
        assert!(items.get("no-color").is_none());
    }

    #[test]
    fn command_line_items_follow_declaration_order() {
        let options = vec![
            OptionSpec::new(["--a"]).default_value("1"),
            OptionSpec::new(["--b"]),
        ];
        let items = items(options, "--b 2 --a 3", &[], vec![]);
        let keys: Vec<&str> = items.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(items.get("a"), Some(&SettingValue::from("3")));
    }

    // --- writing ---

    #[test]
    fn writes_every_path() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.ini");
        let b = dir.path().join("b.ini");
        write_config_files(&[a.clone(), b.clone()], "x = 1\n").unwrap();
        assert_eq!(fs::read_to_string(&a).unwrap(), "x = 1\n");
        assert_eq!(fs::read_to_string(&b).unwrap(), "x = 1\n");
    }

    #[test]
    fn unopenable_path_fails_before_writing() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.ini");
        let bad = dir.path().join("missing-dir").join("bad.ini");
        let err = write_config_files(&[good.clone(), bad.clone()], "x = 1\n").unwrap_err();
        match err {
            ArgfigError::WriteConfig { path, .. } => assert_eq!(path, bad),
            other => panic!("Expected WriteConfig, got {other:?}"),
        }
        assert_eq!(fs::read_to_string(&good).unwrap(), "");
    }
}
