// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics adapter for Commbot.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. When enabled, the
//! exporter serves the text format on its own HTTP listener.

pub mod recording;

use std::net::SocketAddr;

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusBuilder;

use commbot_core::CommbotError;
use commbot_core::traits::adapter::PluginAdapter;
use commbot_core::types::{AdapterType, HealthStatus};

pub use recording::{
    record_catalog_refresh, record_chat_event, record_content_request, record_delivery,
    record_refill, set_live_collectors,
};

/// Prometheus metrics adapter.
///
/// Installs the Prometheus recorder globally together with an HTTP listener
/// answering scrapes on `listen_address`.
pub struct PrometheusAdapter {
    listen_address: SocketAddr,
}

impl PrometheusAdapter {
    /// Installs the recorder and starts the exporter listener.
    ///
    /// Must be called from within a Tokio runtime. Only one recorder can be
    /// installed per process.
    pub fn install(listen_address: SocketAddr) -> Result<Self, CommbotError> {
        PrometheusBuilder::new()
            .with_http_listener(listen_address)
            .install()
            .map_err(|e| {
                CommbotError::Internal(format!("failed to install Prometheus exporter: {e}"))
            })?;

        recording::register_metrics();

        tracing::info!(address = %listen_address, "prometheus exporter listening");

        Ok(Self { listen_address })
    }

    /// Address the exporter listens on.
    pub fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, CommbotError> {
        Ok(HealthStatus::Healthy)
    }
}
