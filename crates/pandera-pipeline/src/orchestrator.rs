//! Compute request orchestrator.
//!
//! Owns the request lifecycle of one form session:
//!
//! ```text
//! Idle      --submit--> Loading --success--> Succeeded
//! Loading   --failure--> Failed
//! Succeeded --submit--> Loading
//! Failed    --submit--> Loading
//! Loading   --submit--> Loading   (previous submission superseded)
//! ```
//!
//! All state changes go through `LifecycleSnapshot::reduce`, applied by the
//! single owner of the `Orchestrator`. Request tasks and the progress ticker
//! only send events tagged with their `SubmissionId`; a completion from any
//! submission but the latest is dropped. Superseded requests are not
//! cancelled, only ignored.

use pandera_config::ClientConfig;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::payload::RequestPayload;
use crate::progress::{next_frame, ProgressTicker};
use crate::relay::{RelayClient, RelayError};
use crate::render::{decode, PlotSpec};

/// The only failure text ever shown to the user.
pub const FAILURE_MESSAGE: &str = "Error in retrieving the data, Finance API might be down";

/// Identity of one submission within a session. Strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SubmissionId(u64);

impl SubmissionId {
    pub fn first() -> Self {
        Self(1)
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LifecycleState {
    #[default]
    Idle,
    Loading,
    Succeeded(PlotSpec),
    Failed(String),
}

impl LifecycleState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle         => "idle",
            Self::Loading      => "loading",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_)    => "failed",
        }
    }
}

#[derive(Debug)]
pub enum OrchestratorEvent {
    Submitted { submission: SubmissionId },
    Tick { submission: SubmissionId },
    Completed {
        submission: SubmissionId,
        outcome: Result<String, RelayError>,
    },
}

/// Everything an observer needs to draw the result area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifecycleSnapshot {
    /// Latest submission, `None` before the first one.
    pub submission: Option<SubmissionId>,
    pub state: LifecycleState,
    /// Progress frame, meaningful only while loading.
    pub progress: u8,
}

impl LifecycleSnapshot {
    pub fn reduce(self, event: OrchestratorEvent) -> Self {
        match event {
            OrchestratorEvent::Submitted { submission } => Self {
                submission: Some(submission),
                state: LifecycleState::Loading,
                progress: 0,
            },
            OrchestratorEvent::Tick { submission } => {
                if self.state.is_loading() && self.submission == Some(submission) {
                    Self { progress: next_frame(self.progress), ..self }
                } else {
                    self
                }
            }
            OrchestratorEvent::Completed { submission, outcome } => {
                if self.submission != Some(submission) || !self.state.is_loading() {
                    debug!(%submission, latest = ?self.submission, "Discarding stale response");
                    return self;
                }
                let state = match outcome {
                    Ok(raw) => match decode(&raw) {
                        Ok(plot) => LifecycleState::Succeeded(plot),
                        Err(e) => {
                            warn!(%submission, error = %e, "Visualization spec could not be decoded");
                            LifecycleState::Failed(FAILURE_MESSAGE.to_string())
                        }
                    },
                    Err(e) => {
                        warn!(%submission, error = %e, "Compute request failed");
                        LifecycleState::Failed(FAILURE_MESSAGE.to_string())
                    }
                };
                Self { submission: Some(submission), state, progress: 0 }
            }
        }
    }
}

/// Single-owner driver of the lifecycle for one form session.
pub struct Orchestrator<R: RelayClient> {
    relay: Arc<R>,
    progress_interval: Duration,
    next_id: SubmissionId,
    current: LifecycleSnapshot,
    ticker: Option<ProgressTicker>,
    events_tx: mpsc::UnboundedSender<OrchestratorEvent>,
    events_rx: mpsc::UnboundedReceiver<OrchestratorEvent>,
    watch_tx: watch::Sender<LifecycleSnapshot>,
}

impl<R: RelayClient> Orchestrator<R> {
    pub fn new(relay: Arc<R>, progress_interval: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (watch_tx, _) = watch::channel(LifecycleSnapshot::default());
        Self {
            relay,
            progress_interval,
            next_id: SubmissionId::first(),
            current: LifecycleSnapshot::default(),
            ticker: None,
            events_tx,
            events_rx,
            watch_tx,
        }
    }

    pub fn from_config(relay: Arc<R>, config: &ClientConfig) -> Self {
        Self::new(relay, Duration::from_millis(config.progress_interval_ms))
    }

    /// Receiver that yields a new snapshot on every visible change.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleSnapshot> {
        self.watch_tx.subscribe()
    }

    pub fn snapshot(&self) -> &LifecycleSnapshot {
        &self.current
    }

    pub fn state(&self) -> &LifecycleState {
        &self.current.state
    }

    pub fn ticker_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Enter Loading and send `payload` through the relay in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, payload: RequestPayload) -> SubmissionId {
        let submission = self.next_id;
        self.next_id = submission.next();
        info!(%submission, kind = %payload.kind(), "Submitting compute request");

        self.apply(OrchestratorEvent::Submitted { submission });

        let relay = Arc::clone(&self.relay);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = relay.compute(payload).await;
            // The session may be gone; nothing left to notify.
            let _ = events.send(OrchestratorEvent::Completed { submission, outcome });
        });
        submission
    }

    /// Wait for and apply one event. Returns `false` once the session is
    /// shut down and no events remain.
    pub async fn next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Drive events until the state leaves Loading.
    pub async fn settle(&mut self) -> &LifecycleState {
        while self.current.state.is_loading() {
            if !self.next_event().await {
                break;
            }
        }
        &self.current.state
    }

    /// Apply every event already queued, without waiting.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Stop the ticker and refuse further events.
    pub fn shutdown(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
        self.events_rx.close();
        debug!("Orchestrator shut down");
    }

    fn apply(&mut self, event: OrchestratorEvent) {
        let previous = std::mem::take(&mut self.current);
        let from = previous.state.name();
        self.current = previous.reduce(event);
        if from != self.current.state.name() {
            debug!(from, to = self.current.state.name(), "Lifecycle transition");
        }
        self.sync_ticker();

        let current = &self.current;
        self.watch_tx.send_if_modified(|published| {
            if published == current {
                false
            } else {
                *published = current.clone();
                true
            }
        });
    }

    /// The ticker runs exactly while Loading, for the latest submission.
    fn sync_ticker(&mut self) {
        match (&self.current.state, self.current.submission) {
            (LifecycleState::Loading, Some(submission)) => {
                if self.ticker.as_ref().map(ProgressTicker::submission) != Some(submission) {
                    // Replacing the old ticker drops and aborts it.
                    self.ticker = Some(ProgressTicker::start(
                        submission,
                        self.progress_interval,
                        self.events_tx.clone(),
                    ));
                }
            }
            _ => {
                if let Some(ticker) = self.ticker.take() {
                    ticker.stop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pandera_common::{ComputationKind, Constraint, ConstraintSchema, TIME_PERIOD_LABEL};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::selection::SelectionMap;
    use crate::window::derive_window;

    const SPEC_A: &str = r#"{"data":[{"name":"A"}],"layout":{}}"#;
    const SPEC_B: &str = r#"{"data":[{"name":"B"}],"layout":{}}"#;

    /// Relay that answers each call from a script of (delay, outcome).
    struct ScriptedRelay {
        script: Mutex<VecDeque<(u64, Result<&'static str, u16>)>>,
    }

    impl ScriptedRelay {
        fn new(script: Vec<(u64, Result<&'static str, u16>)>) -> Arc<Self> {
            Arc::new(Self { script: Mutex::new(script.into()) })
        }
    }

    #[async_trait]
    impl RelayClient for ScriptedRelay {
        async fn compute(&self, _payload: RequestPayload) -> Result<String, RelayError> {
            let (delay_ms, outcome) = self.script.lock().unwrap().pop_front().expect("unscripted call");
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            outcome.map(str::to_string).map_err(RelayError::Status)
        }
    }

    fn payload() -> RequestPayload {
        let schema = ConstraintSchema::new(vec![
            Constraint::new("Ticker", ["AAPL"]),
            Constraint::new(TIME_PERIOD_LABEL, ["1 month"]),
        ])
        .unwrap();
        let window = derive_window(&ComputationKind::IVMap, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        RequestPayload::resolve(ComputationKind::IVMap, &schema, &SelectionMap::new(), &window).unwrap()
    }

    fn plot_name(state: &LifecycleState) -> &str {
        match state {
            LifecycleState::Succeeded(plot) => plot.data[0]["name"].as_str().unwrap(),
            other => panic!("expected success, got {other:?}"),
        }
    }

    fn orchestrator(relay: Arc<ScriptedRelay>) -> Orchestrator<ScriptedRelay> {
        Orchestrator::new(relay, Duration::from_millis(500))
    }

    #[test]
    fn test_reduce_ignores_stale_and_foreign_events() {
        let a = SubmissionId::first();
        let b = a.next();
        let snap = LifecycleSnapshot::default()
            .reduce(OrchestratorEvent::Submitted { submission: a })
            .reduce(OrchestratorEvent::Submitted { submission: b })
            .reduce(OrchestratorEvent::Tick { submission: a })
            .reduce(OrchestratorEvent::Completed { submission: a, outcome: Ok(SPEC_A.to_string()) });
        assert_eq!(snap.state, LifecycleState::Loading);
        assert_eq!(snap.progress, 0);

        let snap = snap.reduce(OrchestratorEvent::Tick { submission: b });
        assert_eq!(snap.progress, 1);

        let snap = snap.reduce(OrchestratorEvent::Completed { submission: b, outcome: Ok(SPEC_B.to_string()) });
        assert_eq!(plot_name(&snap.state), "B");

        let after = snap.clone().reduce(OrchestratorEvent::Tick { submission: b });
        assert_eq!(after, snap);
    }

    #[test]
    fn test_reduce_undecodable_spec_fails() {
        let a = SubmissionId::first();
        let snap = LifecycleSnapshot::default()
            .reduce(OrchestratorEvent::Submitted { submission: a })
            .reduce(OrchestratorEvent::Completed { submission: a, outcome: Ok("{oops".to_string()) });
        assert_eq!(snap.state, LifecycleState::Failed(FAILURE_MESSAGE.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success() {
        let mut orch = orchestrator(ScriptedRelay::new(vec![(200, Ok(SPEC_A))]));
        assert_eq!(orch.state(), &LifecycleState::Idle);

        orch.submit(payload());
        assert_eq!(orch.state(), &LifecycleState::Loading);
        assert!(orch.ticker_running());

        assert_eq!(plot_name(orch.settle().await), "A");
        assert!(!orch.ticker_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_failure_and_resubmit() {
        let mut orch = orchestrator(ScriptedRelay::new(vec![(50, Err(500)), (50, Ok(SPEC_B))]));

        orch.submit(payload());
        assert_eq!(orch.settle().await, &LifecycleState::Failed(FAILURE_MESSAGE.to_string()));

        orch.submit(payload());
        assert_eq!(orch.state(), &LifecycleState::Loading);
        assert_eq!(plot_name(orch.settle().await), "B");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_embedded_spec_never_succeeds() {
        let mut orch = orchestrator(ScriptedRelay::new(vec![(10, Ok("<html>nope</html>"))]));
        orch.submit(payload());
        assert_eq!(orch.settle().await, &LifecycleState::Failed(FAILURE_MESSAGE.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_first_response_is_suppressed() {
        let mut orch = orchestrator(ScriptedRelay::new(vec![(2_000, Ok(SPEC_A)), (100, Ok(SPEC_B))]));
        let a = orch.submit(payload());
        let b = orch.submit(payload());
        assert!(a < b);

        assert_eq!(plot_name(orch.settle().await), "B");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(orch.drain() >= 1);
        assert_eq!(plot_name(orch.state()), "B");
        assert_eq!(orch.snapshot().submission, Some(b));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_stale_response_keeps_loading() {
        let mut orch = orchestrator(ScriptedRelay::new(vec![(100, Err(502)), (1_000, Ok(SPEC_B))]));
        orch.submit(payload());
        orch.submit(payload());

        tokio::time::sleep(Duration::from_millis(300)).await;
        orch.drain();
        assert_eq!(orch.state(), &LifecycleState::Loading);

        assert_eq!(plot_name(orch.settle().await), "B");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_leaving_loading() {
        let mut orch = orchestrator(ScriptedRelay::new(vec![(1_200, Ok(SPEC_A))]));
        let mut rx = orch.subscribe();
        orch.submit(payload());

        let mut frames = Vec::new();
        while orch.state().is_loading() {
            orch.next_event().await;
            if orch.state().is_loading() {
                frames.push(orch.snapshot().progress);
            }
        }
        assert_eq!(frames, vec![1, 2]);
        assert!(!orch.ticker_running());

        rx.borrow_and_update();
        tokio::time::sleep(Duration::from_secs(5)).await;
        orch.drain();
        assert!(!rx.has_changed().unwrap());
        assert_eq!(orch.snapshot().progress, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_loading_then_result() {
        let mut orch = orchestrator(ScriptedRelay::new(vec![(100, Ok(SPEC_A))]));
        let mut rx = orch.subscribe();

        orch.submit(payload());
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().state.is_loading());

        orch.settle().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(plot_name(&rx.borrow_and_update().state), "A");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticker_and_events() {
        let mut orch = orchestrator(ScriptedRelay::new(vec![(1_000, Ok(SPEC_A))]));
        orch.submit(payload());
        orch.shutdown();
        assert!(!orch.ticker_running());

        tokio::time::sleep(Duration::from_secs(2)).await;
        orch.drain();
        assert!(!orch.next_event().await);
    }
}
