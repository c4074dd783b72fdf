//! Periodic liveness probe against `GET /ping`.
//!
//! The heartbeat is a single-attempt, fire-and-forget probe: any 2xx
//! response marks the service connected, anything else marks it
//! disconnected, and nothing is ever retried. Browser (`wasm32`) embedders
//! drive their own timers, so this module is native-only.

use std::time::Duration;

use reqwest::header;
use tokio::time::{interval, MissedTickBehavior};

use crate::{CampusCardClient, Connectivity};

/// Probe timeout, deliberately shorter than the request timeout: a slow
/// `/ping` already means the connection is in trouble.
const PROBE_TIMEOUT_MS: u64 = 5_000;

impl CampusCardClient {
    /// Starts the heartbeat, probing every
    /// [`ClientOptions::heartbeat_period_ms`](crate::ClientOptions::heartbeat_period_ms).
    ///
    /// Idempotent: starting while a heartbeat is already running replaces
    /// it, leaving exactly one active interval. Clones of the client share
    /// the same heartbeat.
    pub fn start_heartbeat(&self) {
        let mut slot = self.heartbeat.lock().expect("heartbeat mutex poisoned");
        // Stop the prior interval before starting a fresh one.
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let period = Duration::from_millis(self.options().heartbeat_period_ms.max(1));
        let client = self.clone();
        *slot = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; consume it so probes
            // start one full period after startup, matching the interval
            // contract.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                client.probe_liveness().await;
            }
        }));

        #[cfg(feature = "tracing")]
        tracing::debug!(period_ms = period.as_millis() as u64, "heartbeat started");
    }

    /// Stops the heartbeat. Safe to call when none is running.
    pub fn stop_heartbeat(&self) {
        let mut slot = self.heartbeat.lock().expect("heartbeat mutex poisoned");
        if let Some(task) = slot.take() {
            task.abort();

            #[cfg(feature = "tracing")]
            tracing::debug!("heartbeat stopped");
        }
    }

    /// Whether a heartbeat task is currently alive.
    pub fn heartbeat_running(&self) -> bool {
        let slot = self.heartbeat.lock().expect("heartbeat mutex poisoned");
        slot.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// One probe: single attempt, status updated either way.
    pub(crate) async fn probe_liveness(&self) {
        let healthy = self.ping_once().await;
        self.status().set(if healthy {
            Connectivity::Connected
        } else {
            Connectivity::Disconnected
        });

        #[cfg(feature = "tracing")]
        if !healthy {
            tracing::warn!("liveness probe failed");
        }
    }

    async fn ping_once(&self) -> bool {
        let response = self
            .http()
            .get(self.endpoint_url("/ping"))
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(Duration::from_millis(PROBE_TIMEOUT_MS))
            .send()
            .await;
        matches!(response, Ok(response) if response.status().is_success())
    }
}
