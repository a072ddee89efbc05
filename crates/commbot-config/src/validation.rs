// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty object keys, positive intervals, and credentials required
//! by the enabled features.

use crate::diagnostic::ConfigError;
use crate::model::{AttachmentCacheConfig, CatalogStoreKind, CommbotConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CommbotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.content.requests_queue_size == 0 {
        errors.push(validation("content.requests_queue_size must be at least 1"));
    }

    let intervals = [
        (
            "content.collectors_cleaning_interval_secs",
            config.content.collectors_cleaning_interval_secs,
        ),
        (
            "catalog.phrases_refresh_interval_secs",
            config.catalog.phrases_refresh_interval_secs,
        ),
        (
            "catalog.commands_refresh_interval_secs",
            config.catalog.commands_refresh_interval_secs,
        ),
        ("warden.check_interval_secs", config.warden.check_interval_secs),
        ("vk.long_poll_wait_secs", config.vk.long_poll_wait_secs),
    ];
    for (key, secs) in intervals {
        if secs == 0 {
            errors.push(validation(&format!("{key} must be at least 1 second")));
        }
    }

    let caches = [
        ("picture", &config.content.picture),
        ("audio", &config.content.audio),
        ("video", &config.content.video),
        ("document", &config.content.document),
    ];
    for (kind, cache) in caches {
        validate_cache(kind, cache, &mut errors);
    }

    for (key, value) in [
        ("catalog.phrases_key", &config.catalog.phrases_key),
        ("catalog.commands_key", &config.catalog.commands_key),
        ("vk.api_base_url", &config.vk.api_base_url),
        ("vk.api_version", &config.vk.api_version),
    ] {
        if value.trim().is_empty() {
            errors.push(validation(&format!("{key} must not be empty")));
        }
    }

    if config.metrics.enabled
        && config
            .metrics
            .listen_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(validation(&format!(
            "metrics.listen_address `{}` is not a valid socket address",
            config.metrics.listen_address
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the settings `commbot serve` cannot run without.
///
/// Kept apart from [`validate_config`] so `check-config` and tests accept a
/// credential-free configuration.
pub fn validate_for_serve(config: &CommbotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config
        .vk
        .community_bot_token
        .as_deref()
        .is_none_or(|t| t.trim().is_empty())
    {
        errors.push(ConfigError::MissingKey {
            key: "vk.community_bot_token".to_string(),
        });
    }

    if config.vk.community_id.is_none() {
        errors.push(ConfigError::MissingKey {
            key: "vk.community_id".to_string(),
        });
    }

    if config.functionality.membership_checking && config.vk.community_chat_id.is_none() {
        errors.push(validation(
            "vk.community_chat_id is required when functionality.membership_checking is enabled",
        ));
    }

    match config.catalog.store {
        CatalogStoreKind::Http if config.catalog.base_url.is_none() => {
            errors.push(ConfigError::MissingKey {
                key: "catalog.base_url".to_string(),
            });
        }
        CatalogStoreKind::Fs if config.catalog.root_dir.is_none() => {
            errors.push(ConfigError::MissingKey {
                key: "catalog.root_dir".to_string(),
            });
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_cache(kind: &str, cache: &AttachmentCacheConfig, errors: &mut Vec<ConfigError>) {
    if cache.max_cached_attachments == 0 {
        errors.push(validation(&format!(
            "content.{kind}.max_cached_attachments must be at least 1"
        )));
    }
    if !cache.cache_refresh_threshold.is_finite() {
        errors.push(validation(&format!(
            "content.{kind}.cache_refresh_threshold must be a finite number"
        )));
    }
}

fn validation(message: &str) -> ConfigError {
    ConfigError::Validation {
        message: message.to_string(),
    }
}
