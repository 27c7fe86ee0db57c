//! The permissive INI/YAML-like config file dialect.
//!
//! ```text
//! # comment          ; comment          [section]          ---
//! key = value        key: value         key value
//! flag                                  (same as flag = true)
//! list = [a, b, c]
//! quoted = "  keeps spaces # and markers  "   # trailing comment
//! ```
//!
//! Only the minimal dialect is covered. Section headers and document
//! separators are skipped, not interpreted.

use crate::error::ArgfigError;
#[cfg(feature = "toml")]
use crate::toml_format::TomlConfigFileParser;
use crate::types::{ConfigFormat, SettingValue, Settings};

/// Parser and serializer for the default config file dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigFileParser;

impl ConfigFileParser {
    /// Parse config text into settings. A repeated key keeps the last value.
    ///
    /// `source_name` is only used in error messages.
    pub fn parse(&self, source_name: &str, text: &str) -> Result<Settings, ArgfigError> {
        self.parse_with_list_keys(source_name, text, |_| false)
    }

    /// Like [`parse`](Self::parse), but a repeated scalar line whose key satisfies
    /// `is_list_key` adds one element to a list instead of replacing the value.
    pub fn parse_with_list_keys(
        &self,
        source_name: &str,
        text: &str,
        is_list_key: impl Fn(&str) -> bool,
    ) -> Result<Settings, ArgfigError> {
        let mut settings = Settings::new();

        for (i, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if is_skipped(line) {
                continue;
            }

            let Some((key, value)) = parse_line(line) else {
                return Err(ArgfigError::ConfigSyntax {
                    source_name: source_name.to_string(),
                    line: i + 1,
                    content: line.to_string(),
                });
            };

            if let SettingValue::Scalar(item) = &value
                && is_list_key(key)
                && let Some(existing) = settings.get_mut(key)
            {
                match existing {
                    SettingValue::List(items) => items.push(item.clone()),
                    SettingValue::Scalar(first) => {
                        *existing = SettingValue::List(vec![first.clone(), item.clone()]);
                    }
                }
                continue;
            }
            settings.insert(key, value);
        }

        Ok(settings)
    }

    /// Render settings as `key = value` lines. Lists render as `[a, b, c]`.
    pub fn serialize(&self, settings: &Settings) -> String {
        let mut out = String::new();
        for (key, value) in settings.iter() {
            out.push_str(&format!("{key} = {value}\n"));
        }
        out
    }

    pub fn syntax_description(&self) -> &'static str {
        "The recognized syntax for setting (key, value) pairs is based on the INI and \
         YAML formats (e.g. key=value or foo=TRUE). Lists are written as [a, b, c]."
    }
}

impl ConfigFormat {
    pub(crate) fn parse(
        self,
        source_name: &str,
        text: &str,
        is_list_key: impl Fn(&str) -> bool,
    ) -> Result<Settings, ArgfigError> {
        match self {
            ConfigFormat::Simple => {
                ConfigFileParser.parse_with_list_keys(source_name, text, is_list_key)
            }
            #[cfg(feature = "toml")]
            ConfigFormat::Toml => TomlConfigFileParser.parse(source_name, text),
        }
    }

    pub(crate) fn serialize(self, settings: &Settings) -> String {
        match self {
            ConfigFormat::Simple => ConfigFileParser.serialize(settings),
            #[cfg(feature = "toml")]
            ConfigFormat::Toml => TomlConfigFileParser.serialize(settings),
        }
    }

    pub(crate) fn syntax_description(self) -> &'static str {
        match self {
            ConfigFormat::Simple => ConfigFileParser.syntax_description(),
            #[cfg(feature = "toml")]
            ConfigFormat::Toml => TomlConfigFileParser.syntax_description(),
        }
    }
}

fn is_skipped(line: &str) -> bool {
    line.is_empty()
        || line.starts_with('#')
        || line.starts_with(';')
        || line.starts_with('[')
        || line.starts_with("---")
}

/// Split one trimmed, non-comment line into its key and value.
fn parse_line(line: &str) -> Option<(&str, SettingValue)> {
    let key_end = line
        .find(|c: char| c.is_whitespace() || matches!(c, ':' | '=' | ';' | '#'))
        .unwrap_or(line.len());
    if key_end == 0 {
        return None;
    }
    let key = &line[..key_end];
    let after_key = &line[key_end..];
    let rest = after_key.trim_start();
    let had_space = rest.len() != after_key.len();

    let raw_value = if let Some(v) = rest.strip_prefix([':', '=']) {
        v.trim_start()
    } else if rest.is_empty() || (had_space && starts_comment(rest)) {
        return Some((key, SettingValue::Scalar("true".to_string())));
    } else if had_space {
        rest
    } else {
        // `;` or `#` glued to the key
        return None;
    };

    let value = strip_inline_comment(raw_value).trim_end();
    Some((key, interpret_value(value)))
}

fn starts_comment(s: &str) -> bool {
    s.starts_with('#') || s.starts_with(';')
}

/// Cut a trailing ` # comment` / ` ; comment`, honoring a leading quoted section.
fn strip_inline_comment(value: &str) -> &str {
    if let Some(quote) = value.chars().next().filter(|c| matches!(c, '"' | '\'')) {
        for (i, c) in value.char_indices().skip(1) {
            if c != quote {
                continue;
            }
            let after = &value[i + 1..];
            let trimmed = after.trim_start();
            if trimmed.is_empty() || (trimmed.len() != after.len() && starts_comment(trimmed)) {
                return &value[..=i];
            }
        }
    }

    let mut prev_is_space = false;
    for (i, c) in value.char_indices() {
        if prev_is_space && matches!(c, '#' | ';') {
            return &value[..i];
        }
        prev_is_space = c.is_whitespace();
    }
    value
}

fn interpret_value(value: &str) -> SettingValue {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return SettingValue::Scalar(value[1..value.len() - 1].to_string());
        }
    }
    SettingValue::from_raw(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(line: &str) -> (String, SettingValue) {
        let settings = ConfigFileParser.parse("test", line).unwrap();
        assert_eq!(settings.len(), 1, "line {line:?}");
        let (k, v) = settings.iter().next().unwrap();
        (k.to_string(), v.clone())
    }

    fn scalar(line: &str) -> String {
        match parse_one(line).1 {
            SettingValue::Scalar(s) => s,
            other => panic!("Expected scalar for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn basic_round_trip() {
        let settings = ConfigFileParser.parse("test", "a: 3\n").unwrap();
        assert_eq!(settings.get("a"), Some(&SettingValue::from("3")));
        assert_eq!(ConfigFileParser.serialize(&settings), "a = 3\n");
    }

    #[test]
    fn all_syntax_forms() {
        let text = "# comment1 \n[ some section ]\n----\n---------\n_a: 3\n; comment2 \n\
                    _b = c\n_list_arg1 = [a, b, c]\n_str_arg = true\n_list_arg2 = [1, 2, 3]\n";
        let settings = ConfigFileParser.parse("test", text).unwrap();

        let keys: Vec<&str> = settings.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["_a", "_b", "_list_arg1", "_str_arg", "_list_arg2"]
        );
        assert_eq!(
            settings.get("_list_arg1"),
            Some(&SettingValue::List(vec!["a".into(), "b".into(), "c".into()]))
        );
        assert_eq!(
            ConfigFileParser.serialize(&settings),
            "_a = 3\n_b = c\n_list_arg1 = [a, b, c]\n_str_arg = true\n_list_arg2 = [1, 2, 3]\n"
        );
    }

    #[test]
    fn separators_and_spacing() {
        for line in [
            "key=value",
            "key =value",
            "key= value",
            "key  =  value",
            " key  =  value ",
            "key:value",
            "key : value",
            " key  :  value ",
            "key value",
            " key    value ",
        ] {
            assert_eq!(parse_one(line), ("key".into(), "value".into()), "{line:?}");
        }
    }

    #[test]
    fn whitespace_separated_value_keeps_inner_spaces() {
        assert_eq!(scalar("z z 1"), "z 1");
        assert_eq!(scalar("y  \t 9.1"), "9.1");
    }

    #[test]
    fn inline_comments() {
        assert_eq!(scalar("key = value # comment # comment"), "value");
        assert_eq!(scalar("key=value#comment "), "value#comment");
        assert_eq!(scalar("key=value #comment"), "value");
        assert_eq!(scalar(" key  :  value  ;  comment"), "value");
        assert_eq!(scalar("key:value;comment"), "value;comment");
        assert_eq!(scalar("y 12.1  ; with comment"), "12.1");
    }

    #[test]
    fn quoted_values() {
        assert_eq!(scalar(r#"key="value""#), "value");
        assert_eq!(scalar(r#" key  =  " value " "#), " value ");
        assert_eq!(scalar("key  =  ' value '"), " value ");
        assert_eq!(scalar(r#"key=""#), "\"");
        assert_eq!(scalar(r#"key = '"value"'"#), "\"value\"");
        assert_eq!(scalar(r#"key = ""value"""#), "\"value\"");
        assert_eq!(scalar(r#"key="value"#), "\"value");
        assert_eq!(scalar(r#" key  =  value " "#), "value \"");
        assert_eq!(scalar("key='value"), "'value");
    }

    #[test]
    fn comment_markers_inside_quotes() {
        assert_eq!(scalar(r#"key = "value # comment" # comment"#), "value # comment");
        assert_eq!(scalar(r##"key = "#" ; comment"##), "#");
        assert_eq!(scalar(r#"key = ";" # comment"#), ";");
    }

    #[test]
    fn blank_values() {
        for line in ["key=", "key = ", " key  =   ", "key:", " key  :   "] {
            assert_eq!(scalar(line), "", "{line:?}");
        }
    }

    #[test]
    fn key_only_means_true() {
        for line in ["key", "key ", " key     ", "key # enabled"] {
            assert_eq!(scalar(line), "true", "{line:?}");
        }
    }

    #[test]
    fn separator_characters_as_values() {
        assert_eq!(scalar("key=:"), ":");
        assert_eq!(scalar("key :="), "=");
        assert_eq!(scalar("key=="), "=");
        assert_eq!(scalar(" key  :  : "), ":");
    }

    #[test]
    fn negative_values() {
        assert_eq!(scalar("key = -10"), "-10");
        assert_eq!(scalar("key -10"), "-10");
        assert_eq!(scalar("key  =  '-10'"), "-10");
    }

    #[test]
    fn key_characters() {
        for key in ["key_underscore", "_key", "key-dash", "key@word", "key$word", "key.word", "--format"] {
            assert_eq!(parse_one(&format!("{key} = v")).0, key);
        }
    }

    #[test]
    fn quoted_list_stays_scalar() {
        assert_eq!(scalar("key = '[a, b]'"), "[a, b]");
    }

    #[test]
    fn last_occurrence_wins() {
        let settings = ConfigFileParser
            .parse("test", "arg-z = 30\narg-z = 40\n")
            .unwrap();
        assert_eq!(settings.get("arg-z"), Some(&SettingValue::from("40")));
    }

    #[test]
    fn repeated_list_keys_accumulate() {
        let settings = ConfigFileParser
            .parse_with_list_keys("test", "arg-z = 30\nother = 1\narg-z = 40\nother = 2\n", |k| {
                k == "arg-z"
            })
            .unwrap();
        assert_eq!(
            settings.get("arg-z"),
            Some(&SettingValue::List(vec!["30".into(), "40".into()]))
        );
        assert_eq!(settings.get("other"), Some(&SettingValue::from("2")));
    }

    #[test]
    fn invalid_line_reports_source_and_line() {
        let err = ConfigFileParser
            .parse("app.ini", "a = 1\n\n= nope\n")
            .unwrap_err();
        match err {
            ArgfigError::ConfigSyntax {
                source_name, line, ..
            } => {
                assert_eq!(source_name, "app.ini");
                assert_eq!(line, 3);
            }
            other => panic!("Expected ConfigSyntax, got {other:?}"),
        }
    }

    #[test]
    fn serialize_then_parse_is_identity() {
        let settings: Settings = [
            ("host", SettingValue::from("localhost")),
            ("tags", SettingValue::List(vec!["x".into(), "y".into()])),
            ("empty", SettingValue::from("")),
        ]
        .into_iter()
        .collect();
        let text = ConfigFileParser.serialize(&settings);
        assert_eq!(ConfigFileParser.parse("rt", &text).unwrap(), settings);
    }
}
