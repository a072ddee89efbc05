// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./commbot.toml` > `~/.config/commbot/commbot.toml` > `/etc/commbot/commbot.toml`
//! with environment variable overrides via `COMMBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CommbotConfig;

/// Top-level sections that env var names may start with.
const SECTIONS: &[&str] = &[
    "functionality",
    "catalog",
    "content",
    "metrics",
    "warden",
    "agent",
    "chat",
    "vk",
];

/// Nested tables inside `[content]`.
const CONTENT_TABLES: &[&str] = &["picture", "audio", "video", "document"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/commbot/commbot.toml` (system-wide)
/// 3. `~/.config/commbot/commbot.toml` (user XDG config)
/// 4. `./commbot.toml` (local directory)
/// 5. `COMMBOT_*` environment variables
pub fn load_config() -> Result<CommbotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CommbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CommbotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CommbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CommbotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CommbotConfig::default()))
        .merge(Toml::file("/etc/commbot/commbot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("commbot/commbot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("commbot.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Uses `Env::map()` NOT `Env::split("_")`: `COMMBOT_VK_COMMUNITY_BOT_TOKEN`
/// must map to `vk.community_bot_token`, not `vk.community.bot.token`.
/// Figment hands the key over in its original case.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("COMMBOT_").map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
///
/// Only a leading section name is rewritten; unknown names pass through
/// unchanged so `deny_unknown_fields` reports them.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        else {
            continue;
        };

        if *section == "content" {
            for table in CONTENT_TABLES {
                if let Some(field) = rest.strip_prefix(table).and_then(|r| r.strip_prefix('_')) {
                    return format!("content.{table}.{field}");
                }
            }
        }
        return format!("{section}.{rest}");
    }
    key.to_string()
}
