//! # Auto-Close Scheduler
//!
//! Daily sweep that force-completes sessions left open past the shift
//! window, guarding against shippers who never explicitly end their
//! session. Each session is closed independently through the idempotent
//! `complete_session`; one failure is logged and the sweep moves on.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::ShiftConfig;
use crate::orchestration::session_manager::SessionLifecycleManager;
use crate::storage::DispatchStore;

/// Result of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Open sessions found inside the window
    pub swept: usize,
    /// Sessions force-completed
    pub closed: usize,
    /// Sessions that failed to close (logged, not fatal)
    pub failed: usize,
}

/// Timer loop owned by the process; no external scheduling runtime.
pub struct AutoCloseScheduler {
    store: Arc<dyn DispatchStore>,
    sessions: Arc<SessionLifecycleManager>,
    shift: ShiftConfig,
}

impl AutoCloseScheduler {
    pub fn new(
        store: Arc<dyn DispatchStore>,
        sessions: Arc<SessionLifecycleManager>,
        shift: ShiftConfig,
    ) -> Self {
        Self {
            store,
            sessions,
            shift,
        }
    }

    /// Run the daily loop: sleep until the configured cutoff, sweep, repeat.
    pub async fn run(self) {
        loop {
            let now = Utc::now();
            let next = self.next_fire(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(fire_at = %next, "auto-close scheduler sleeping until next cutoff");
            tokio::time::sleep(wait).await;

            let report = self.sweep(Utc::now()).await;
            info!(
                swept = report.swept,
                closed = report.closed,
                failed = report.failed,
                "auto-close sweep finished"
            );
        }
    }

    /// Next cutoff instant strictly after `now`.
    pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.shift.auto_close_at).and_utc();
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }

    /// Sweep once for the day containing `now`: force-complete every
    /// non-terminal session whose start time falls inside the configured
    /// shift window. Runs to completion; per-session failures never abort
    /// the rest.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let day = now.date_naive();
        let from = day.and_time(self.shift.window_start).and_utc();
        let to = day.and_time(self.shift.window_end).and_utc();

        let sessions = match self
            .store
            .list_open_sessions_started_between(from, to)
            .await
        {
            Ok(sessions) => sessions,
            Err(e) => {
                error!(error = %e, "auto-close sweep could not list sessions");
                return SweepReport::default();
            }
        };

        let mut report = SweepReport {
            swept: sessions.len(),
            ..SweepReport::default()
        };

        for session in sessions {
            match self.sessions.complete_session(session.session_id).await {
                Ok(_) => report.closed += 1,
                Err(e) => {
                    warn!(
                        session_id = %session.session_id,
                        shipper_id = %session.shipper_id,
                        error = %e,
                        "auto-close failed for session"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }
}
