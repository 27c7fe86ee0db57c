//! TOML config files.
//!
//! Top-level keys map directly to settings. A `[section]` table is flattened
//! one level so its keys land next to the top-level ones, the same way the
//! simple dialect ignores section headers. Scalars are stringified and
//! arrays become lists.

use crate::error::ArgfigError;
use crate::types::{SettingValue, Settings};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TomlConfigFileParser;

impl TomlConfigFileParser {
    pub fn parse(&self, source_name: &str, text: &str) -> Result<Settings, ArgfigError> {
        let table: toml::Table = text.parse().map_err(|e: toml::de::Error| {
            let line = e
                .span()
                .map(|span| line_number(text, span.start))
                .unwrap_or(1);
            ArgfigError::ConfigSyntax {
                source_name: source_name.to_string(),
                line,
                content: e.message().to_string(),
            }
        })?;

        let mut settings = Settings::new();
        for (key, value) in &table {
            match value {
                toml::Value::Table(section) => {
                    for (inner_key, inner) in section {
                        let v = convert(inner)
                            .ok_or_else(|| unsupported(source_name, text, inner_key))?;
                        settings.insert(inner_key.as_str(), v);
                    }
                }
                other => {
                    let v = convert(other).ok_or_else(|| unsupported(source_name, text, key))?;
                    settings.insert(key.as_str(), v);
                }
            }
        }
        Ok(settings)
    }

    pub fn serialize(&self, settings: &Settings) -> String {
        let mut doc = toml_edit::DocumentMut::new();
        for (key, value) in settings.iter() {
            let item = match value {
                SettingValue::Scalar(s) => parse_toml_edit_value(s),
                SettingValue::List(items) => {
                    let array: toml_edit::Array =
                        items.iter().map(|s| parse_toml_edit_value(s)).collect();
                    toml_edit::Value::Array(array)
                }
            };
            doc[key] = toml_edit::value(item);
        }
        doc.to_string()
    }

    pub fn syntax_description(&self) -> &'static str {
        "Config files are TOML documents. Keys inside [section] tables are read as \
         top-level keys and arrays set list options."
    }
}

fn convert(value: &toml::Value) -> Option<SettingValue> {
    match value {
        toml::Value::Array(items) => items
            .iter()
            .map(scalar_string)
            .collect::<Option<Vec<_>>>()
            .map(SettingValue::List),
        other => scalar_string(other).map(SettingValue::Scalar),
    }
}

fn scalar_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

fn unsupported(source_name: &str, text: &str, key: &str) -> ArgfigError {
    let line = text
        .lines()
        .position(|l| l.trim_start().starts_with(key))
        .map_or(1, |i| i + 1);
    ArgfigError::ConfigSyntax {
        source_name: source_name.to_string(),
        line,
        content: format!("'{key}' must be a scalar or an array of scalars"),
    }
}

fn line_number(text: &str, offset: usize) -> usize {
    text.get(..offset).map_or(1, |s| s.matches('\n').count() + 1)
}

/// Parse a raw string value into a `toml_edit::Value` with type heuristics.
fn parse_toml_edit_value(s: &str) -> toml_edit::Value {
    if s.eq_ignore_ascii_case("true") {
        return toml_edit::Value::from(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return toml_edit::Value::from(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return toml_edit::Value::from(i);
    }
    if s.contains('.')
        && let Ok(f) = s.parse::<f64>()
    {
        return toml_edit::Value::from(f);
    }
    toml_edit::Value::from(s)
}
