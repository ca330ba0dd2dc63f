//! Scheduled denylist sweeps.

use crate::tokens::TokenService;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run one sweep and log the outcome.
///
/// Returns the number of removed entries, or `None` if the sweep failed.
pub async fn run_sweep(tokens: &TokenService) -> Option<u64> {
    match tokens.sweep().await {
        Ok(count) => {
            if count > 0 {
                info!("Swept {} expired denylist entries", count);
            }
            Some(count)
        }
        Err(e) => {
            error!("Failed to sweep denylist: {}", e);
            None
        }
    }
}

/// Handle to a running sweep scheduler. Dropping it leaves the task running.
pub struct SweepHandle {
    handle: JoinHandle<()>,
}

impl SweepHandle {
    /// Stop the scheduler. A sweep in progress is cancelled at its next await.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawn a background task that sweeps every `every`, starting immediately.
///
/// Sweeps never overlap. If one runs past the next tick, the missed tick is
/// skipped.
pub fn spawn_sweep_scheduler(tokens: TokenService, every: Duration) -> SweepHandle {
    // tokio panics on a zero period
    let every = every.max(Duration::from_millis(1));

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            run_sweep(&tokens).await;
        }
    });

    SweepHandle { handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DenylistEntry};
    use crate::jwt::{FixedClock, JwtConfig};
    use std::sync::Arc;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    #[tokio::test]
    async fn test_run_sweep_reports_count() {
        let db = Database::open(":memory:").await.unwrap();
        let clock = Arc::new(FixedClock::starting_now());
        let jwt = Arc::new(JwtConfig::with_clock(b"secret", HOUR, clock.clone()).unwrap());
        let tokens = TokenService::new(jwt, &db);

        let issued = tokens.issue("alice").unwrap();
        tokens.invalidate(&issued.token).await.unwrap();
        assert_eq!(run_sweep(&tokens).await, Some(0));

        clock.advance(2 * HOUR);
        assert_eq!(run_sweep(&tokens).await, Some(1));
    }

    #[tokio::test]
    async fn test_run_sweep_failure_is_none() {
        let db = Database::open(":memory:").await.unwrap();
        let jwt = Arc::new(JwtConfig::new(b"secret", HOUR).unwrap());
        let tokens = TokenService::new(jwt, &db);

        db.denylist()
            .create(DenylistEntry::invalidated("x"))
            .await
            .unwrap();
        db.close().await;

        assert_eq!(run_sweep(&tokens).await, None);
    }

    #[tokio::test]
    async fn test_abort_stops_scheduler() {
        let db = Database::open(":memory:").await.unwrap();
        let jwt = Arc::new(JwtConfig::new(b"secret", HOUR).unwrap());
        let tokens = TokenService::new(jwt, &db);

        let handle = spawn_sweep_scheduler(tokens, Duration::from_millis(10));
        assert!(!handle.is_finished());

        handle.abort();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !handle.is_finished() {
            assert!(tokio::time::Instant::now() < deadline, "scheduler still running");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}
