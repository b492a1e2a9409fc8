//! One open compute form.
//!
//! A session owns the selections, the card it was opened for, a clock and
//! its orchestrator. The window is re-derived from the clock on every use,
//! while selections persist as literal date strings until the user moves a
//! handle again or the session is closed.

use pandera_common::ModelCard;
use pandera_config::ClientConfig;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::form::{self, ControlDescriptor, FormError, FormInput};
use crate::orchestrator::{LifecycleState, Orchestrator, SubmissionId};
use crate::payload::{PayloadError, RequestPayload};
use crate::relay::RelayClient;
use crate::render::DisplayPanel;
use crate::selection::{SelectionMap, END_DATE_KEY, START_DATE_KEY};
use crate::slider::format_date;
use crate::window::{derive_window, Clock, DateWindow, SystemClock};

pub struct FormSession<R: RelayClient, C: Clock = SystemClock> {
    id: Uuid,
    card: ModelCard,
    selection: SelectionMap,
    clock: C,
    orchestrator: Orchestrator<R>,
}

impl<R: RelayClient, C: Clock> FormSession<R, C> {
    /// Open a form for `card`. Date selections are seeded from the default
    /// window so the range control starts at its full extent.
    pub fn open(card: ModelCard, relay: Arc<R>, clock: C, config: &ClientConfig) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            card,
            selection: SelectionMap::new(),
            clock,
            orchestrator: Orchestrator::from_config(relay, config),
        };
        session.seed_date_defaults();
        info!(session = %session.id, kind = %session.card.kind, title = %session.card.title, "Form session opened");
        session
    }

    fn seed_date_defaults(&mut self) {
        if !self.card.constraints.has_time_period() {
            return;
        }
        let window = self.window();
        self.selection.set_if_absent(START_DATE_KEY, format_date(window.start()));
        self.selection.set_if_absent(END_DATE_KEY, format_date(window.end()));
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn card(&self) -> &ModelCard {
        &self.card
    }

    pub fn selection(&self) -> &SelectionMap {
        &self.selection
    }

    pub fn window(&self) -> DateWindow {
        derive_window(&self.card.kind, self.clock.today())
    }

    pub fn render(&self) -> Vec<ControlDescriptor> {
        form::render(&self.card.constraints, &self.selection, &self.window())
    }

    pub fn input(&mut self, input: FormInput) -> Result<(), FormError> {
        debug!(session = %self.id, ?input, "Form input");
        let window = self.window();
        form::apply(&self.card.constraints, &mut self.selection, &window, input)
    }

    /// Freeze the selections and start a compute request.
    pub fn submit(&mut self) -> Result<SubmissionId, PayloadError> {
        let payload = RequestPayload::resolve(
            self.card.kind.clone(),
            &self.card.constraints,
            &self.selection,
            &self.window(),
        )?;
        Ok(self.orchestrator.submit(payload))
    }

    pub fn orchestrator(&self) -> &Orchestrator<R> {
        &self.orchestrator
    }

    pub async fn settle(&mut self) -> &LifecycleState {
        self.orchestrator.settle().await
    }

    pub fn view(&self) -> DisplayPanel<'_> {
        let snapshot = self.orchestrator.snapshot();
        DisplayPanel::for_state(&snapshot.state, snapshot.progress)
    }

    pub fn close(mut self) {
        self.orchestrator.shutdown();
        info!(session = %self.id, "Form session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use pandera_common::{default_cards, ComputationKind};
    use std::sync::Mutex;

    use crate::relay::RelayError;
    use crate::render::PLACEHOLDER_TEXT;

    #[derive(Default)]
    struct RecordingRelay {
        seen: Mutex<Vec<serde_json::Value>>,
    }

    #[async_trait]
    impl RelayClient for RecordingRelay {
        async fn compute(&self, payload: RequestPayload) -> Result<String, RelayError> {
            self.seen.lock().unwrap().push(serde_json::to_value(&payload).unwrap());
            Ok(r#"{"data":[]}"#.to_string())
        }
    }

    #[derive(Clone)]
    struct SharedClock(Arc<Mutex<NaiveDate>>);

    impl Clock for SharedClock {
        fn today(&self) -> NaiveDate {
            *self.0.lock().unwrap()
        }
    }

    fn ivmap_card() -> ModelCard {
        default_cards().into_iter().find(|c| c.kind == ComputationKind::IVMap).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_open_seeds_dates_and_submits_defaults() {
        let relay = Arc::new(RecordingRelay::default());
        let clock = crate::window::FixedClock(d(2024, 6, 15));
        let mut session = FormSession::open(ivmap_card(), Arc::clone(&relay), clock, &ClientConfig::default());

        assert_eq!(session.selection().start_date(), Some("2024-06-16"));
        assert_eq!(session.selection().end_date(), Some("2026-06-15"));
        assert_eq!(session.view(), DisplayPanel::Placeholder(PLACEHOLDER_TEXT));

        session.submit().unwrap();
        assert!(matches!(session.view(), DisplayPanel::Loading(_)));
        assert!(matches!(session.settle().await, LifecycleState::Succeeded(_)));

        let seen = relay.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            serde_json::json!({
                "parameters": {"Ticker": "AAPL", "Start Date": "2024-06-16", "End Date": "2026-06-15"},
                "graphType": "IVMap",
            })
        );
        drop(seen);
        session.close();
    }

    #[tokio::test]
    async fn test_selections_are_not_rescaled_when_window_moves() {
        let today = Arc::new(Mutex::new(d(2024, 1, 1)));
        let clock = SharedClock(Arc::clone(&today));
        let relay = Arc::new(RecordingRelay::default());
        let mut session = FormSession::open(ivmap_card(), relay, clock, &ClientConfig::default());

        session.input(FormInput::DragStart(10)).unwrap();
        assert_eq!(session.selection().start_date(), Some("2024-01-12"));

        *today.lock().unwrap() += Duration::days(5);
        assert_eq!(session.selection().start_date(), Some("2024-01-12"));
        match &session.render()[1] {
            ControlDescriptor::Range { start_offset, start_date, .. } => {
                assert_eq!(start_date, "2024-01-12");
                assert_eq!(*start_offset, 5);
            }
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_choice_input_flows_into_payload() {
        let relay = Arc::new(RecordingRelay::default());
        let clock = crate::window::FixedClock(d(2024, 6, 15));
        let card = default_cards().into_iter().find(|c| c.kind == ComputationKind::OrderFlowCanyon).unwrap();
        let mut session = FormSession::open(card, Arc::clone(&relay), clock, &ClientConfig::default());

        session.input(FormInput::choose("Ticker", "GOOGL")).unwrap();
        assert!(session.input(FormInput::choose("Ticker", "TSLA")).is_err());
        session.submit().unwrap();
        session.settle().await;

        let seen = relay.seen.lock().unwrap();
        assert_eq!(seen[0]["parameters"]["Ticker"], "GOOGL");
        assert_eq!(seen[0]["parameters"]["Start Date"], "2021-06-15");
        assert_eq!(seen[0]["graphType"], "OrderFlowCanyon");
    }
}
