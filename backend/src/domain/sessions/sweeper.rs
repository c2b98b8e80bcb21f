//! Scheduled expiry sweep.
//!
//! Runs [`SessionManager::sweep_expired`] on a fixed interval until the
//! handle is shut down. A panicking pass is logged and the loop carries on
//! with the next tick.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::SessionManager;
use crate::domain::ports::RecordStore;

/// Handle to the background sweep task.
#[derive(Debug)]
pub struct SessionSweeper {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionSweeper {
    /// Spawn the sweep loop on the current Tokio runtime.
    ///
    /// The first pass runs one `interval` after spawning.
    pub fn spawn<R>(manager: Arc<SessionManager<R>>, interval: Duration) -> Self
    where
        R: RecordStore + ?Sized + 'static,
    {
        let (shutdown, mut stop) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + interval, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = interval.as_secs(), "session sweeper started");
            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        match AssertUnwindSafe(manager.sweep_expired()).catch_unwind().await {
                            Ok(evicted) => debug!(evicted, "session sweep pass finished"),
                            Err(_) => warn!("session sweep pass panicked; retrying next interval"),
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("session sweeper stopped");
        });
        Self { shutdown, task }
    }

    /// Stop the loop and wait for the task to finish.
    pub async fn shutdown(self) {
        if self.shutdown.send(true).is_err() {
            debug!("session sweeper already stopped");
        }
        if let Err(error) = self.task.await {
            warn!(%error, "session sweeper task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use chrono::{TimeZone, Utc};
    use mockable::Clock;

    use super::*;
    use crate::domain::sessions::{BeginSession, SessionConfig};
    use crate::test_support::{InMemoryRecordStore, MutableClock};

    #[tokio::test(start_paused = true)]
    async fn evicts_expired_sessions_on_schedule_and_stops() {
        let clock = Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
                .single()
                .expect("valid instant"),
        ));
        let manager = Arc::new(SessionManager::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::clone(&clock) as Arc<dyn Clock>,
            SessionConfig::default(),
        ));
        manager
            .begin_session(BeginSession {
                roll_number: "R1".to_owned(),
                name: "Alice".to_owned(),
                ..BeginSession::default()
            })
            .await
            .expect("session starts");

        let sweeper = SessionSweeper::spawn(Arc::clone(&manager), Duration::from_secs(60));
        clock.advance(Duration::from_secs(2 * 60 * 60));
        time::sleep(Duration::from_secs(61)).await;
        assert_eq!(manager.active_sessions().await, 0);

        tokio::time::timeout(Duration::from_secs(5), sweeper.shutdown())
            .await
            .expect("sweeper stops promptly");
    }
}
