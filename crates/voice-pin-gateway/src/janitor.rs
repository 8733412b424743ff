//! Periodic eviction of finished and abandoned sessions.

use crate::registry::{EvictionReport, SessionRegistry};
use serde::Deserialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Janitor schedule.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JanitorConfig {
    /// Time between sweeps
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Maximum age of a pending session
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
            ttl: Duration::from_secs(60 * 60),
        }
    }
}

/// Removes verified sessions and pending sessions past their TTL.
pub struct SessionJanitor {
    registry: SessionRegistry,
    config: JanitorConfig,
}

impl SessionJanitor {
    pub fn new(registry: SessionRegistry, config: JanitorConfig) -> Self {
        Self { registry, config }
    }

    /// Run a single sweep.
    pub async fn sweep_once(&self) -> EvictionReport {
        let ttl = match chrono::Duration::from_std(self.config.ttl) {
            Ok(ttl) => ttl,
            Err(e) => {
                warn!("Janitor TTL out of range, skipping sweep: {}", e);
                return EvictionReport {
                    remaining: self.registry.count().await,
                    ..EvictionReport::default()
                };
            }
        };

        let report = self.registry.evict_expired_and_verified(ttl).await;

        if report.removed() > 0 {
            info!(
                verified = report.verified,
                expired = report.expired,
                remaining = report.remaining,
                "Cleanup: removed {} sessions",
                report.removed()
            );
        } else {
            debug!(remaining = report.remaining, "Cleanup: no sessions removed");
        }

        report
    }

    /// Run the janitor indefinitely, sleeping between sweeps.
    pub async fn run(&self) {
        info!(
            "Starting session janitor, interval: {:?}, ttl: {:?}",
            self.config.interval, self.config.ttl
        );

        loop {
            tokio::time::sleep(self.config.interval).await;
            self.sweep_once().await;
        }
    }
}

/// Spawn the janitor as a background task.
pub fn spawn_janitor(janitor: SessionJanitor) -> JoinHandle<()> {
    tokio::spawn(async move {
        janitor.run().await;
    })
}
