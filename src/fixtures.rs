#[cfg(test)]
pub mod test {
    use std::fs;

    use tempfile::TempDir;

    use crate::builder::ArgParser;
    use crate::option::OptionSpec;

    pub fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    pub fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Write `contents` to `name` inside `dir`, returning the full path.
    pub fn write_file(dir: &TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    /// Parser with `-c/--config` and a `-f/--format` option bound to
    /// `OUTPUT_FORMAT`, defaulting to `BED`.
    pub fn format_parser(default_files: &[&str]) -> ArgParser {
        let mut parser = ArgParser::builder()
            .prog("test")
            .default_config_files(default_files.iter().copied())
            .config_path_flags(["-c", "--config"])
            .build()
            .unwrap();
        parser
            .add_option(
                OptionSpec::new(["-f", "--format"])
                    .env_var("OUTPUT_FORMAT")
                    .default_value("BED")
                    .help("Output format"),
            )
            .unwrap();
        parser
    }

    #[test]
    fn format_parser_registers_options() {
        let parser = format_parser(&[]);
        let dests: Vec<&str> = parser.options().iter().map(|o| o.get_dest()).collect();
        assert_eq!(dests, vec!["config", "format"]);
    }
}
