// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. Without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_gauge};

/// Register all Commbot metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "commbot_content_requests_total",
        "Content requests taken off the dispatcher queue"
    );
    describe_counter!(
        "commbot_content_deliveries_total",
        "Content request outcomes by result"
    );
    describe_counter!(
        "commbot_collector_refills_total",
        "Attachment collector refills by media kind"
    );
    describe_gauge!("commbot_collectors_live", "Live attachment collectors");
    describe_counter!(
        "commbot_catalog_refreshes_total",
        "Catalog refresh attempts by catalog and outcome"
    );
    describe_counter!(
        "commbot_chat_events_total",
        "Chat events handled by kind"
    );
}

/// Record a request popped by the dispatcher.
pub fn record_content_request() {
    metrics::counter!("commbot_content_requests_total").increment(1);
}

/// Record how a content request ended (`delivered`, `retry`, `dropped`).
pub fn record_delivery(outcome: &'static str) {
    metrics::counter!("commbot_content_deliveries_total", "outcome" => outcome).increment(1);
}

/// Record a collector refill and how many attachments it added.
pub fn record_refill(media_kind: &str, added: usize) {
    metrics::counter!("commbot_collector_refills_total", "media_kind" => media_kind.to_string())
        .increment(1);
    metrics::counter!(
        "commbot_collector_refilled_attachments_total",
        "media_kind" => media_kind.to_string()
    )
    .increment(added as u64);
}

/// Set the number of live collectors.
pub fn set_live_collectors(count: usize) {
    metrics::gauge!("commbot_collectors_live").set(count as f64);
}

/// Record a catalog refresh attempt (`ok` or `error`).
pub fn record_catalog_refresh(catalog: &'static str, outcome: &'static str) {
    metrics::counter!(
        "commbot_catalog_refreshes_total",
        "catalog" => catalog,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a handled chat event.
pub fn record_chat_event(kind: &'static str) {
    metrics::counter!("commbot_chat_events_total", "kind" => kind).increment(1);
}
