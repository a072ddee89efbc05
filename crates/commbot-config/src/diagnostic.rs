// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment extraction errors into miette diagnostics.
//!
//! Every diagnostic names the dotted config key and the `COMMBOT_*` variable
//! that sets it. When the offending entry lives in a TOML file the report
//! points at it, including entries under nested headers such as
//! `[content.audio]`.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a "did you mean" hint.
const SUGGESTION_THRESHOLD: f64 = 0.75;

const ENV_PREFIX: &str = "COMMBOT_";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(commbot::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys, env_var.as_deref()))
    )]
    UnknownKey {
        /// Dotted path of the key, e.g. `vk.comunity_id`.
        key: String,
        /// Closest valid key in the same table.
        suggestion: Option<String>,
        valid_keys: String,
        /// Set when the key came from the environment rather than a file.
        env_var: Option<String>,
        #[label("not a known key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid value for `{key}`: {detail}")]
    #[diagnostic(
        code(commbot::config::invalid_type),
        help("{}", invalid_type_help(expected, env_var.as_deref()))
    )]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        env_var: Option<String>,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(code(commbot::config::missing_key), help("{}", missing_key_help(key)))]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(commbot::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(commbot::config::other))]
    Other(String),
}

/// The `COMMBOT_*` variable that sets the dotted `key`.
///
/// Inverse of [`crate::loader::map_env_key`].
pub fn env_var_name(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.replace('.', "_").to_ascii_uppercase())
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str, env_var: Option<&str>) -> String {
    let mut help = match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    };
    if let Some(var) = env_var {
        help.push_str(&format!("; unset `{var}` or rename it"));
    }
    help
}

fn invalid_type_help(expected: &str, env_var: Option<&str>) -> String {
    match env_var {
        Some(var) => format!("set `{var}` to {expected}"),
        None => format!("expected {expected}"),
    }
}

fn missing_key_help(key: &str) -> String {
    let (table, field) = key.rsplit_once('.').unwrap_or(("", key));
    if table.is_empty() {
        format!("add `{field} = <value>` to commbot.toml or set `{}`", env_var_name(key))
    } else {
        format!(
            "add `{field} = <value>` under `[{table}]` in commbot.toml or set `{}`",
            env_var_name(key)
        )
    }
}

/// Converts a `figment::Error` into one diagnostic per underlying error.
///
/// `toml_sources` pairs a display name with file contents and is searched
/// for the offending entry. A key not found in any source, but whose
/// `COMMBOT_*` variable is set, is reported against the variable.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    let mut errors = Vec::new();
    for error in err {
        let path: Vec<String> = error.path.to_vec();
        let config_error = match &error.kind {
            Kind::UnknownField(field, expected) => {
                let key = dotted(&path, field);
                let located = locate(&error, toml_sources, &path, field)
                    .map(|(entry, src)| (SourceSpan::new(entry.key.into(), field.len()), src));
                let env_var = env_origin(&key, located.is_some());
                let (span, src) = located.unzip();
                ConfigError::UnknownKey {
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    key,
                    env_var,
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: dotted(&path, field),
            },
            Kind::InvalidType(actual, expected) | Kind::InvalidValue(actual, expected) => {
                let key = path.join(".");
                let located = path.split_last().and_then(|(field, table)| {
                    locate(&error, toml_sources, table, field)
                });
                let located = located.map(|(entry, src)| {
                    (SourceSpan::new(entry.value.into(), entry.value_len), src)
                });
                let env_var = env_origin(&key, located.is_some());
                let (span, src) = located.unzip();
                ConfigError::InvalidType {
                    detail: format!("found {actual}, expected {expected}"),
                    expected: expected.to_string(),
                    key,
                    env_var,
                    span,
                    src,
                }
            }
            _ => ConfigError::Other(error.to_string()),
        };
        errors.push(config_error);
    }
    errors
}

fn dotted(table: &[String], field: &str) -> String {
    if table.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", table.join("."))
    }
}

fn env_origin(key: &str, found_in_file: bool) -> Option<String> {
    if found_in_file {
        return None;
    }
    let var = env_var_name(key);
    std::env::var_os(&var).map(|_| var)
}

/// Finds the entry in the file figment blamed, falling back to every source.
fn locate(
    error: &figment::Error,
    toml_sources: &[(String, String)],
    table: &[String],
    field: &str,
) -> Option<(TomlEntry, NamedSource<String>)> {
    let blamed = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let candidates = toml_sources
        .iter()
        .filter(|(name, _)| blamed.as_deref().is_none_or(|b| b == name.as_str()))
        .chain(toml_sources.iter());
    for (name, content) in candidates {
        if let Some(entry) = find_entry(content, table, field) {
            return Some((entry, NamedSource::new(name, content.clone())));
        }
    }
    None
}

/// Byte offsets of a `field = value` line inside a TOML table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TomlEntry {
    pub key: usize,
    pub value: usize,
    pub value_len: usize,
}

/// Finds `field` directly under the `[table]` header (`table` empty means the
/// top level). Dotted headers such as `[content.audio]` are matched whole.
pub fn find_entry(content: &str, table: &[String], field: &str) -> Option<TomlEntry> {
    let wanted = table.join(".");
    let mut current = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let body = line.trim_start();
        let indent = line.len() - body.len();

        if let Some(header) = body.strip_prefix('[') {
            current = header.split(']').next().unwrap_or_default().trim().to_string();
            continue;
        }
        if current != wanted {
            continue;
        }
        let Some(after_key) = body.strip_prefix(field) else {
            continue;
        };
        let Some(value) = after_key.trim_start().strip_prefix('=') else {
            continue;
        };
        let value_text = value.trim();
        let value_text = value_text
            .split_once(" #")
            .map_or(value_text, |(v, _)| v.trim_end());
        let value_start = start + indent + field.len() + (after_key.len() - value.len())
            + (value.len() - value.trim_start().len());
        return Some(TomlEntry {
            key: start + indent,
            value: value_start,
            value_len: value_text.len(),
        });
    }
    None
}

/// Closest valid key by Jaro-Winkler similarity, if any clears the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Renders diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}
