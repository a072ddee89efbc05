// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `commbot serve` command implementation.
//!
//! Loads the catalog from the configured object store, connects to VK, and
//! runs the long poll bridge, event router, content dispatcher and
//! membership warden until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use commbot_catalog::{CatalogCache, CatalogSettings};
use commbot_config::model::CommbotConfig;
use commbot_content::{DispatcherSettings, MessageStyle, RequestDispatcher};
use commbot_core::{CommbotError, PlatformAdapter};
use commbot_vk::{EventRouter, LongPollBridge, MembershipWarden, RouterSettings, VkClient};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::shutdown;

/// Capacity of the channel between the long poll bridge and the router.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Runs the `commbot serve` command.
///
/// The catalog must load before anything else starts; a failed initial load
/// aborts startup.
pub async fn run_serve(config: CommbotConfig) -> Result<(), CommbotError> {
    init_tracing(&config.agent.log_level);

    info!("starting commbot serve");

    #[cfg(feature = "prometheus")]
    let _prometheus = if config.metrics.enabled {
        let address = config.metrics.listen_address.parse().map_err(|e| {
            CommbotError::Config(format!(
                "metrics.listen_address `{}` is invalid: {e}",
                config.metrics.listen_address
            ))
        })?;
        Some(commbot_prometheus::PrometheusAdapter::install(address)?)
    } else {
        None
    };

    let store = commbot_storage::open_store(&config.catalog)?;
    let catalog = Arc::new(
        CatalogCache::load(store, CatalogSettings::from(&config.catalog)).await?,
    );

    let group_id = config
        .vk
        .community_id
        .ok_or_else(|| CommbotError::Config("vk.community_id is required".into()))?;
    let client = Arc::new(VkClient::from_config(&config.vk)?);
    let platform: Arc<dyn PlatformAdapter> = client.clone();

    let cancel = shutdown::install_signal_handler();
    let mut tasks: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

    let (dispatcher, requests) = RequestDispatcher::new(
        Arc::clone(&catalog),
        Arc::clone(&platform),
        DispatcherSettings::from(&config),
    );
    tasks.push(("dispatcher", tokio::spawn(dispatcher.run(cancel.clone()))));

    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let router = EventRouter::new(
        Arc::clone(&catalog),
        Arc::clone(&platform),
        requests,
        RouterSettings::from(&config),
    );
    tasks.push(("router", tokio::spawn(router.run(events_rx, cancel.clone()))));

    let bridge = LongPollBridge::new(
        Arc::clone(&client),
        group_id,
        config.vk.long_poll_wait_secs,
        events_tx,
    );
    tasks.push(("long_poll", tokio::spawn(bridge.run(cancel.clone()))));

    if config.functionality.membership_checking {
        let chat_id = config.vk.community_chat_id.ok_or_else(|| {
            CommbotError::Config(
                "vk.community_chat_id is required for membership checking".into(),
            )
        })?;
        let warden = MembershipWarden::new(
            Arc::clone(&catalog),
            Arc::clone(&platform),
            group_id,
            chat_id,
            client.can_remove_users(),
            Duration::from_secs(config.warden.check_interval_secs),
            MessageStyle {
                use_first_name: config.chat.use_first_name_instead_username,
            },
        );
        tasks.push(("warden", tokio::spawn(warden.run(cancel.clone()))));
    } else {
        info!("membership checking disabled by configuration");
    }

    info!(
        group_id,
        commands = catalog.find_all_commands().await.len(),
        "commbot running"
    );

    cancel.cancelled().await;

    for (name, task) in tasks {
        if let Err(e) = task.await {
            error!(task = name, error = %e, "task ended abnormally");
        }
    }

    info!("commbot stopped");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("commbot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
