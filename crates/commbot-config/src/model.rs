// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Commbot community assistant.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Commbot configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommbotConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Platform credentials and API settings.
    #[serde(default)]
    pub vk: VkConfig,

    /// Object store holding the phrase and command tables.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Content delivery settings.
    #[serde(default)]
    pub content: ContentConfig,

    /// Chat message formatting.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Feature toggles.
    #[serde(default)]
    pub functionality: FunctionalityConfig,

    /// Membership warden settings.
    #[serde(default)]
    pub warden: WardenConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Process-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Platform credentials and API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VkConfig {
    /// Community bot token. Required by `serve`.
    #[serde(default)]
    pub community_bot_token: Option<String>,

    /// Numeric id of the community the bot acts for. Required by `serve`.
    #[serde(default)]
    pub community_id: Option<i64>,

    /// Local chat id of the community chat (peer id minus 2000000000).
    #[serde(default)]
    pub community_chat_id: Option<i64>,

    /// User token of a chat admin, needed to remove users from the chat.
    #[serde(default)]
    pub admin_user_token: Option<String>,

    /// API endpoint.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// API version sent with every call.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Long poll wait time in seconds.
    #[serde(default = "default_long_poll_wait_secs")]
    pub long_poll_wait_secs: u64,
}

impl Default for VkConfig {
    fn default() -> Self {
        Self {
            community_bot_token: None,
            community_id: None,
            community_chat_id: None,
            admin_user_token: None,
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            long_poll_wait_secs: default_long_poll_wait_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.vk.com/method".to_string()
}

fn default_api_version() -> String {
    "5.199".to_string()
}

fn default_long_poll_wait_secs() -> u64 {
    25
}

/// Which object store backend serves the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogStoreKind {
    /// Plain HTTP GET against `base_url`.
    #[default]
    Http,
    /// Local directory at `root_dir`.
    Fs,
}

/// Catalog location and refresh configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Object store backend.
    #[serde(default)]
    pub store: CatalogStoreKind,

    /// Bucket URL for the `http` store, e.g. `https://storage.example.net/commbot`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Directory for the `fs` store.
    #[serde(default)]
    pub root_dir: Option<String>,

    /// Object key of the phrases table.
    #[serde(default = "default_phrases_key")]
    pub phrases_key: String,

    /// Object key of the commands table.
    #[serde(default = "default_commands_key")]
    pub commands_key: String,

    /// Seconds between phrase table refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub phrases_refresh_interval_secs: u64,

    /// Seconds between command table refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub commands_refresh_interval_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            store: CatalogStoreKind::default(),
            base_url: None,
            root_dir: None,
            phrases_key: default_phrases_key(),
            commands_key: default_commands_key(),
            phrases_refresh_interval_secs: default_refresh_interval_secs(),
            commands_refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

fn default_phrases_key() -> String {
    "phrases.csv".to_string()
}

fn default_commands_key() -> String {
    "commands.csv".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    900 // 15 minutes
}

/// Content delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    /// Capacity of the content request queue.
    #[serde(default = "default_requests_queue_size")]
    pub requests_queue_size: usize,

    /// Seconds between sweeps of collectors whose command left the catalog.
    #[serde(default = "default_collectors_cleaning_interval_secs")]
    pub collectors_cleaning_interval_secs: u64,

    #[serde(default)]
    pub picture: AttachmentCacheConfig,

    #[serde(default)]
    pub audio: AttachmentCacheConfig,

    #[serde(default)]
    pub video: AttachmentCacheConfig,

    #[serde(default)]
    pub document: AttachmentCacheConfig,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            requests_queue_size: default_requests_queue_size(),
            collectors_cleaning_interval_secs: default_collectors_cleaning_interval_secs(),
            picture: AttachmentCacheConfig::default(),
            audio: AttachmentCacheConfig::default(),
            video: AttachmentCacheConfig::default(),
            document: AttachmentCacheConfig::default(),
        }
    }
}

fn default_requests_queue_size() -> usize {
    100
}

fn default_collectors_cleaning_interval_secs() -> u64 {
    600 // 10 minutes
}

/// Per media kind attachment cache limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentCacheConfig {
    /// Upper bound on cached attachments per command.
    #[serde(default = "default_max_cached_attachments")]
    pub max_cached_attachments: usize,

    /// Fraction of `max_cached_attachments` at or below which the cache refills.
    /// Values outside 0.0-1.0 are clamped.
    #[serde(default = "default_cache_refresh_threshold")]
    pub cache_refresh_threshold: f64,
}

impl Default for AttachmentCacheConfig {
    fn default() -> Self {
        Self {
            max_cached_attachments: default_max_cached_attachments(),
            cache_refresh_threshold: default_cache_refresh_threshold(),
        }
    }
}

impl AttachmentCacheConfig {
    /// The refill threshold clamped to 0.0-1.0.
    pub fn clamped_threshold(&self) -> f64 {
        if self.cache_refresh_threshold.is_nan() {
            return default_cache_refresh_threshold();
        }
        self.cache_refresh_threshold.clamp(0.0, 1.0)
    }
}

fn default_max_cached_attachments() -> usize {
    100
}

fn default_cache_refresh_threshold() -> f64 {
    0.2
}

/// Chat message formatting.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Mention users as `@screen_name (first_name)` instead of `@screen_name`.
    #[serde(default)]
    pub use_first_name_instead_username: bool,
}

/// Feature toggles.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionalityConfig {
    #[serde(default = "default_enabled")]
    pub welcome_new_members: bool,

    #[serde(default = "default_enabled")]
    pub goodbye_members: bool,

    #[serde(default = "default_enabled")]
    pub membership_checking: bool,

    #[serde(default = "default_enabled")]
    pub content_commands: bool,
}

impl Default for FunctionalityConfig {
    fn default() -> Self {
        Self {
            welcome_new_members: default_enabled(),
            goodbye_members: default_enabled(),
            membership_checking: default_enabled(),
            content_commands: default_enabled(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Membership warden configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WardenConfig {
    /// Seconds between membership checks.
    #[serde(default = "default_warden_interval_secs")]
    pub check_interval_secs: u64,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_warden_interval_secs(),
        }
    }
}

fn default_warden_interval_secs() -> u64 {
    3600 // 1 hour
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Serve `/metrics` over HTTP.
    #[serde(default)]
    pub enabled: bool,

    /// Listener address for the exporter.
    #[serde(default = "default_metrics_listen_address")]
    pub listen_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_address: default_metrics_listen_address(),
        }
    }
}

fn default_metrics_listen_address() -> String {
    "127.0.0.1:9464".to_string()
}
