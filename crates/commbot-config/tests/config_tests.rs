// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Commbot configuration system.

use commbot_config::diagnostic::{ConfigError, figment_to_config_errors};
use commbot_config::model::{CatalogStoreKind, CommbotConfig};
use commbot_config::{load_and_validate_str, load_config_from_path, load_config_from_str};

/// Valid TOML with all sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_commbot_config() {
    let toml = r#"
[agent]
log_level = "debug"

[vk]
community_bot_token = "vk1.a.token"
community_id = 123456
community_chat_id = 3
admin_user_token = "vk1.a.admin"

[catalog]
store = "fs"
root_dir = "/srv/commbot"
phrases_refresh_interval_secs = 60
commands_refresh_interval_secs = 120

[content]
requests_queue_size = 2
collectors_cleaning_interval_secs = 30

[content.audio]
max_cached_attachments = 40
cache_refresh_threshold = 0.5

[chat]
use_first_name_instead_username = true

[functionality]
welcome_new_members = false
membership_checking = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.vk.community_bot_token.as_deref(), Some("vk1.a.token"));
    assert_eq!(config.vk.community_id, Some(123456));
    assert_eq!(config.vk.community_chat_id, Some(3));
    assert_eq!(config.catalog.store, CatalogStoreKind::Fs);
    assert_eq!(config.catalog.root_dir.as_deref(), Some("/srv/commbot"));
    assert_eq!(config.catalog.phrases_refresh_interval_secs, 60);
    assert_eq!(config.catalog.commands_refresh_interval_secs, 120);
    assert_eq!(config.content.requests_queue_size, 2);
    assert_eq!(config.content.collectors_cleaning_interval_secs, 30);
    assert_eq!(config.content.audio.max_cached_attachments, 40);
    assert_eq!(config.content.audio.cache_refresh_threshold, 0.5);
    assert_eq!(config.content.video.max_cached_attachments, 100);
    assert!(config.chat.use_first_name_instead_username);
    assert!(!config.functionality.welcome_new_members);
    assert!(config.functionality.goodbye_members);
    assert!(!config.functionality.membership_checking);
    assert!(config.functionality.content_commands);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.agent.log_level, "info");
    assert!(config.vk.community_bot_token.is_none());
    assert_eq!(config.vk.api_base_url, "https://api.vk.com/method");
    assert_eq!(config.catalog.store, CatalogStoreKind::Http);
    assert_eq!(config.catalog.phrases_key, "phrases.csv");
    assert_eq!(config.catalog.commands_key, "commands.csv");
    assert_eq!(config.catalog.phrases_refresh_interval_secs, 900);
    assert_eq!(config.catalog.commands_refresh_interval_secs, 900);
    assert_eq!(config.content.requests_queue_size, 100);
    assert_eq!(config.content.collectors_cleaning_interval_secs, 600);
    for cache in [
        &config.content.picture,
        &config.content.audio,
        &config.content.video,
        &config.content.document,
    ] {
        assert_eq!(cache.max_cached_attachments, 100);
        assert_eq!(cache.cache_refresh_threshold, 0.2);
    }
    assert!(!config.chat.use_first_name_instead_username);
    assert!(config.functionality.content_commands);
    assert!(!config.metrics.enabled);
}

/// Unknown field in [content] section produces an error mentioning it.
#[test]
fn unknown_field_in_content_produces_error() {
    let toml = r#"
[content]
request_queue_size = 5
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("request_queue_size"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Diagnostics carry a typo suggestion for unknown keys.
#[test]
fn unknown_key_diagnostic_suggests_correction() {
    let toml = r#"
[vk]
comunity_id = 5
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("community_id"));
}

/// Wrong value types are reported as errors.
#[test]
fn invalid_type_is_rejected() {
    let toml = r#"
[content]
requests_queue_size = "lots"
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Semantic validation runs after deserialization.
#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[content]
requests_queue_size = 0

[catalog]
commands_refresh_interval_secs = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2);
}

/// Environment variables override file values through the section mapping.
#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "commbot.toml",
            r#"
[content]
requests_queue_size = 10
"#,
        )?;
        jail.set_env("COMMBOT_CONTENT_REQUESTS_QUEUE_SIZE", "25");
        jail.set_env("COMMBOT_CONTENT_VIDEO_MAX_CACHED_ATTACHMENTS", "7");
        jail.set_env("COMMBOT_VK_COMMUNITY_BOT_TOKEN", "secret");
        jail.set_env("COMMBOT_CHAT_USE_FIRST_NAME_INSTEAD_USERNAME", "true");

        let config: CommbotConfig =
            load_config_from_path(std::path::Path::new("commbot.toml")).map_err(|e| e.to_string())?;
        assert_eq!(config.content.requests_queue_size, 25);
        assert_eq!(config.content.video.max_cached_attachments, 7);
        assert_eq!(config.vk.community_bot_token.as_deref(), Some("secret"));
        assert!(config.chat.use_first_name_instead_username);
        Ok(())
    });
}

/// Unparseable env var values surface as errors instead of silently defaulting.
#[test]
fn unparseable_env_value_fails() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("commbot.toml", "")?;
        jail.set_env("COMMBOT_CONTENT_COLLECTORS_CLEANING_INTERVAL_SECS", "ten minutes");
        let result = load_config_from_path(std::path::Path::new("commbot.toml"));
        assert!(result.is_err());
        Ok(())
    });
}

/// A misspelled variable is reported under its `COMMBOT_*` name.
#[test]
fn unknown_env_key_names_the_variable() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("commbot.toml", "")?;
        jail.set_env("COMMBOT_VK_COMUNITY_ID", "5");

        let err = load_config_from_path(std::path::Path::new("commbot.toml"))
            .expect_err("misspelled key should be rejected");
        let errors = figment_to_config_errors(err, &[]);
        match &errors[..] {
            [ConfigError::UnknownKey { key, suggestion, env_var, span, .. }] => {
                assert_eq!(key, "vk.comunity_id");
                assert_eq!(suggestion.as_deref(), Some("community_id"));
                assert_eq!(env_var.as_deref(), Some("COMMBOT_VK_COMUNITY_ID"));
                assert!(span.is_none());
            }
            other => panic!("unexpected diagnostics: {other:?}"),
        }
        Ok(())
    });
}

/// An unknown key in a nested table is blamed on its line in the file.
#[test]
fn unknown_key_in_nested_table_points_at_the_file() {
    let toml = "[content.audio]\nmax_cached = 5\n";
    let err = load_config_from_str(toml).expect_err("unknown key should be rejected");
    let errors = figment_to_config_errors(err, &[("commbot.toml".into(), toml.into())]);
    match &errors[..] {
        [ConfigError::UnknownKey { key, span: Some(span), env_var, .. }] => {
            assert_eq!(key, "content.audio.max_cached");
            assert_eq!(span.offset(), toml.find("max_cached").unwrap());
            assert!(env_var.is_none());
        }
        other => panic!("unexpected diagnostics: {other:?}"),
    }
}
