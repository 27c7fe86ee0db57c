//! Bridge to the clap flag engine.
//!
//! Option descriptors become a `clap::Command` on every parse. clap does all
//! grammar validation; this module only adds the lenient "known arguments"
//! mode, which peels unknown tokens off one clap error at a time, and the
//! single-option recognizer used to find config file paths.

use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use tracing::trace;

use crate::error::ArgfigError;
use crate::option::OptionSpec;
use crate::types::{Arity, DefaultValue, SettingValue, ValueType};

/// Command-level settings that are not per-option.
#[derive(Debug, Clone, Default)]
pub(crate) struct CommandSettings<'a> {
    pub prog: &'a str,
    pub about: Option<String>,
    pub epilog: Option<&'a str>,
    pub add_help: bool,
    /// Append `[env var: NAME]` to the help of bound options.
    pub env_var_help: bool,
}

pub(crate) fn build_command(settings: &CommandSettings<'_>, options: &[OptionSpec]) -> Command {
    let mut cmd = Command::new(settings.prog.to_string())
        .no_binary_name(true)
        .args_override_self(true)
        .disable_version_flag(true)
        .disable_help_flag(!settings.add_help);
    if let Some(about) = &settings.about {
        cmd = cmd.about(about.clone());
    }
    if let Some(epilog) = settings.epilog {
        cmd = cmd.after_help(epilog.to_string());
    }
    for spec in options {
        cmd = cmd.arg(to_clap_arg(spec, settings.env_var_help));
    }
    cmd
}

pub(crate) fn to_clap_arg(spec: &OptionSpec, env_var_help: bool) -> Arg {
    let mut arg = Arg::new(spec.get_dest().to_string());

    let mut longs = spec.long_flags().map(|f| f[2..].to_string());
    if let Some(first) = longs.next() {
        arg = arg.long(first);
    }
    for alias in longs {
        arg = arg.visible_alias(alias);
    }
    let mut shorts = spec.short_flags();
    if let Some(first) = shorts.next() {
        arg = arg.short(first);
    }
    for alias in shorts {
        arg = arg.visible_short_alias(alias);
    }

    arg = match spec.get_arity() {
        Arity::Scalar => arg.action(ArgAction::Set).num_args(1),
        Arity::OptionalScalar => arg.action(ArgAction::Set).num_args(0..=1),
        Arity::ListAppend if spec.is_positional() => arg.action(ArgAction::Append).num_args(1..),
        Arity::ListAppend => arg.action(ArgAction::Append).num_args(1),
        Arity::Variadic => arg.action(ArgAction::Append).num_args(1..),
        Arity::Flag => arg.action(ArgAction::SetTrue),
        Arity::FlagFalse => arg.action(ArgAction::SetFalse),
        Arity::Counter => arg.action(ArgAction::Count),
    };

    if !spec.get_arity().takes_no_value() {
        arg = match (spec.get_value_type(), spec.get_choices()) {
            (ValueType::Integer, _) => arg.value_parser(value_parser!(i64)),
            (ValueType::Float, _) => arg.value_parser(value_parser!(f64)),
            (ValueType::Path, _) => arg.value_parser(value_parser!(PathBuf)),
            (ValueType::String, Some(choices)) => {
                arg.value_parser(PossibleValuesParser::new(choices.to_vec()))
            }
            (ValueType::String, None) => arg.value_parser(value_parser!(String)),
        };
    }

    let has_default = match spec.get_default() {
        DefaultValue::Value(SettingValue::Scalar(s)) => {
            arg = arg.default_value(s.clone());
            true
        }
        DefaultValue::Value(SettingValue::List(items)) => {
            arg = arg.default_values(items.clone());
            true
        }
        DefaultValue::Unset | DefaultValue::Suppressed => false,
    };
    arg = arg.required(spec.is_required() && !has_default);

    let env_var = spec.get_env_var().filter(|_| env_var_help);
    let help = match (spec.get_help(), env_var) {
        (Some(help), Some(var)) => Some(format!("{help}   [env var: {var}]")),
        (None, Some(var)) => Some(format!("[env var: {var}]")),
        (help, None) => help.map(str::to_string),
    };
    if let Some(help) = help {
        arg = arg.help(help);
    }
    if let Some(name) = spec.get_value_name() {
        arg = arg.value_name(name.to_string());
    }
    arg
}

/// Parse, collecting tokens clap does not recognize instead of failing on them.
///
/// Each `UnknownArgument` error names one offending token; that token is
/// removed and the parse is retried. Unknown tokens come back in their
/// original order. Any other error is returned unchanged.
pub(crate) fn parse_known(
    cmd: &mut Command,
    tokens: &[String],
) -> Result<(ArgMatches, Vec<String>), ArgfigError> {
    let mut remaining: Vec<(usize, String)> = tokens.iter().cloned().enumerate().collect();
    let mut unknown: Vec<(usize, String)> = Vec::new();

    loop {
        let args = remaining.iter().map(|(_, t)| t.clone());
        match cmd.try_get_matches_from_mut(args) {
            Ok(matches) => {
                unknown.sort_by_key(|(i, _)| *i);
                return Ok((matches, unknown.into_iter().map(|(_, t)| t).collect()));
            }
            Err(e) if e.kind() == ErrorKind::UnknownArgument => {
                let Some(pos) = invalid_arg(&e).and_then(|arg| {
                    remaining
                        .iter()
                        .position(|(_, token)| token_matches(token, &arg))
                }) else {
                    return Err(e.into());
                };
                let removed = remaining.remove(pos);
                trace!(token = %removed.1, "Collected unknown argument");
                unknown.push(removed);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Parse with every token required to be known.
pub(crate) fn parse_strict(
    cmd: &mut Command,
    tokens: &[String],
) -> Result<ArgMatches, ArgfigError> {
    Ok(cmd.try_get_matches_from_mut(tokens)?)
}

/// Extract the values given for a single option, ignoring every other token.
///
/// A throwaway command that knows only `spec` (never required, no help flag)
/// is run through the lenient parse.
pub(crate) fn recognize(spec: &OptionSpec, tokens: &[String]) -> Result<Vec<String>, ArgfigError> {
    let standalone = spec.clone().required(false);
    let mut cmd = Command::new("recognizer")
        .no_binary_name(true)
        .args_override_self(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(to_clap_arg(&standalone, false));

    let (matches, _) = parse_known(&mut cmd, tokens)?;
    if matches.value_source(spec.get_dest()) != Some(ValueSource::CommandLine) {
        return Ok(Vec::new());
    }
    Ok(raw_strings(&matches, spec.get_dest()).unwrap_or_default())
}

/// Raw string values bound to `id`, including defaults.
pub(crate) fn raw_strings(matches: &ArgMatches, id: &str) -> Option<Vec<String>> {
    let raw = matches.try_get_raw(id).ok().flatten()?;
    Some(raw.map(|v| v.to_string_lossy().into_owned()).collect())
}

fn invalid_arg(err: &clap::Error) -> Option<String> {
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(s)) => Some(s.clone()),
        _ => None,
    }
}

/// Whether `token` is the one clap reported as `arg`: an exact match, the
/// `--flag=value` form, or a short cluster containing the character.
fn token_matches(token: &str, arg: &str) -> bool {
    if token == arg {
        return true;
    }
    if arg.starts_with("--") {
        return token
            .strip_prefix(arg)
            .is_some_and(|rest| rest.starts_with('='));
    }
    if let Some(c) = arg.strip_prefix('-').filter(|s| s.chars().count() == 1) {
        return token.starts_with('-') && !token.starts_with("--") && token[1..].contains(c);
    }
    false
}
