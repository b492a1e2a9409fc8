//! Cosmetic "Loading..." indicator.
//!
//! The ticker is a task scoped to one Loading phase: started on entry,
//! aborted on exit or drop. It only emits tagged tick events; the owner
//! decides whether a tick is still relevant.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::orchestrator::{OrchestratorEvent, SubmissionId};

/// Number of indicator frames: zero to three dots.
pub const PROGRESS_FRAMES: u8 = 4;

pub fn next_frame(frame: u8) -> u8 {
    (frame + 1) % PROGRESS_FRAMES
}

#[derive(Debug)]
pub struct ProgressTicker {
    submission: SubmissionId,
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    /// Spawn a ticker that sends `Tick` every `period`. The first tick fires
    /// one full period after start.
    pub fn start(
        submission: SubmissionId,
        period: Duration,
        events: UnboundedSender<OrchestratorEvent>,
    ) -> Self {
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if events.send(OrchestratorEvent::Tick { submission }).is_err() {
                    break;
                }
            }
        });
        Self { submission, handle }
    }

    pub fn submission(&self) -> SubmissionId {
        self.submission
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
