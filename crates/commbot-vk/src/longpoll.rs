// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bots Long Poll bridge.
//!
//! Polls the community's long poll server and forwards decoded
//! [`ChatEvent`]s onto an mpsc channel until cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use commbot_core::CommbotError;

use crate::client::VkClient;
use crate::events::{ChatEvent, parse_update};
use crate::types::LongPollResponse;

/// Delay before reconnecting after a transport failure.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// What to do after one poll.
#[derive(Debug, PartialEq, Eq)]
enum PollStep {
    /// Continue from this `ts`.
    Continue(String),
    /// History was lost; continue from the `ts` the server supplied.
    ResetTs(String),
    /// The key expired or the server lost state; fetch a new server.
    Reconnect,
}

/// Forwards long poll events to the router.
pub struct LongPollBridge {
    client: Arc<VkClient>,
    group_id: i64,
    wait_secs: u64,
    events: mpsc::Sender<ChatEvent>,
}

impl LongPollBridge {
    pub fn new(
        client: Arc<VkClient>,
        group_id: i64,
        wait_secs: u64,
        events: mpsc::Sender<ChatEvent>,
    ) -> Self {
        Self {
            client,
            group_id,
            wait_secs,
            events,
        }
    }

    /// Runs until cancelled or until the event receiver is dropped.
    pub async fn run(self, cancel: CancellationToken) {
        info!(group_id = self.group_id, "starting VK long polling");

        'connect: loop {
            let server = tokio::select! {
                server = self.client.long_poll_server(self.group_id) => server,
                _ = cancel.cancelled() => break 'connect,
            };
            let mut server = match server {
                Ok(server) => server,
                Err(e) => {
                    error!(error = %e, "failed to obtain long poll server");
                    if self.pause(&cancel).await {
                        continue 'connect;
                    }
                    break 'connect;
                }
            };

            loop {
                let polled = tokio::select! {
                    polled = self.client.long_poll(&server, &server.ts, self.wait_secs) => polled,
                    _ = cancel.cancelled() => break 'connect,
                };

                match self.handle_poll(polled).await {
                    Ok(PollStep::Continue(ts)) => server.ts = ts,
                    Ok(PollStep::ResetTs(ts)) => {
                        debug!("long poll history lost, continuing from new ts");
                        server.ts = ts;
                    }
                    Ok(PollStep::Reconnect) => {
                        debug!("long poll key expired, reconnecting");
                        continue 'connect;
                    }
                    Err(e) => {
                        warn!(error = %e, "long poll request failed");
                        if self.pause(&cancel).await {
                            continue 'connect;
                        }
                        break 'connect;
                    }
                }

                if self.events.is_closed() {
                    info!("event receiver dropped, stopping long polling");
                    break 'connect;
                }
            }
        }

        info!("VK long polling stopped");
    }

    async fn handle_poll(
        &self,
        polled: Result<LongPollResponse, CommbotError>,
    ) -> Result<PollStep, CommbotError> {
        let response = polled?;
        match response.failed {
            Some(1) => {
                let ts = response.ts_string().ok_or_else(|| {
                    CommbotError::platform("long_poll", "failed=1 without ts")
                })?;
                return Ok(PollStep::ResetTs(ts));
            }
            Some(2) | Some(3) => return Ok(PollStep::Reconnect),
            Some(code) => {
                return Err(CommbotError::platform(
                    "long_poll",
                    format!("unexpected failed code {code}"),
                ));
            }
            None => {}
        }

        for update in &response.updates {
            if let Some(event) = parse_update(update) {
                commbot_prometheus::record_chat_event(event.kind());
                if self.events.send(event).await.is_err() {
                    break;
                }
            }
        }

        response
            .ts_string()
            .map(PollStep::Continue)
            .ok_or_else(|| CommbotError::platform("long_poll", "response without ts"))
    }

    /// Waits before reconnecting. Returns `false` if cancelled meanwhile.
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(RECONNECT_DELAY) => true,
            _ = cancel.cancelled() => false,
        }
    }
}
