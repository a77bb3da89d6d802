//! Request orchestration for the evaluation dashboard.
//!
//! A `Controller` owns the view state and the last successful response. All
//! methods take `&self` so the evaluation flow and the metrics-info flow can be
//! driven concurrently on one thread; the state mutex is never held across an
//! `.await`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::{EvaluationApi, TransportError};
use crate::config::DashboardConfig;
use crate::i18n::Messages;
use crate::model::{EvaluationResponse, EvaluationSuccess, Operator};
use crate::report::{assemble, metrics_info_view, MetricsInfoView, ViewModel};
use crate::view::{Phase, ViewError, ViewEvent, ViewState};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("an evaluation request is already in flight")]
    AlreadyRunning,

    #[error(transparent)]
    View(#[from] ViewError),
}

/// Held for the lifetime of one run; dropping it re-opens the gate even if the
/// run future is dropped mid-request.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct Controller {
    api: Arc<dyn EvaluationApi>,
    config: DashboardConfig,
    state: Mutex<ViewState>,
    last_response: Mutex<Option<EvaluationSuccess>>,
    in_flight: AtomicBool,
    events: Option<mpsc::UnboundedSender<ViewEvent>>,
}

impl Controller {
    pub fn new(api: Arc<dyn EvaluationApi>, config: DashboardConfig) -> Self {
        Self {
            api,
            config,
            state: Mutex::new(ViewState::new()),
            last_response: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            events: None,
        }
    }

    /// Every later transition is also sent to the returned receiver.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ViewEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn messages(&self) -> &'static Messages {
        self.config.locale.messages()
    }

    pub fn phase(&self) -> Phase {
        self.state().phase().clone()
    }

    pub fn modal(&self) -> Option<MetricsInfoView> {
        self.state().modal().cloned()
    }

    /// Side-channel failure shown alongside the main panel, if any.
    pub fn notice(&self) -> Option<String> {
        self.state().notice().map(str::to_string)
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn last_response(&self) -> Option<EvaluationSuccess> {
        self.last_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn run_evaluation(&self) -> Result<Phase, ControllerError> {
        self.run_evaluation_with(self.config.operator).await
    }

    pub async fn run_evaluation_with(&self, operator: Operator) -> Result<Phase, ControllerError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!(operator = %operator, "evaluation already in flight; ignoring request");
            return Err(ControllerError::AlreadyRunning);
        };

        let events = self.state().begin_loading();
        self.publish(events);

        let request = self.config.request(operator);
        info!(
            qrels_file = %request.qrels_file,
            operator = %request.operator,
            "evaluation requested"
        );

        let outcome = match self.api.evaluate(&request).await {
            Ok(EvaluationResponse::Success(success)) => {
                let view = self.build_report(&success, operator);
                *self
                    .last_response
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(*success);
                Phase::Results(Box::new(view))
            }
            Ok(EvaluationResponse::Failure { message, details }) => {
                warn!(
                    error = %message,
                    details = %details.unwrap_or_default(),
                    "evaluation rejected by server"
                );
                if message.trim().is_empty() {
                    Phase::Error(self.messages().unknown_server_error.to_string())
                } else {
                    Phase::Error(message)
                }
            }
            Err(err) => {
                warn!(error = %err, "evaluation request failed");
                Phase::Error(self.messages().transport_error.to_string())
            }
        };

        let (events, panel) = {
            let mut state = self.state();
            let events = state.settle(outcome.clone())?;
            (events, state.visible_panel())
        };
        self.publish(events);
        info!(phase = outcome.name(), panel = ?panel, "evaluation settled");

        Ok(outcome)
    }

    fn build_report(&self, success: &EvaluationSuccess, operator: Operator) -> ViewModel {
        let metrics = &success.metrics;
        let shown = success.reported_operator().unwrap_or(operator);
        if shown != operator {
            warn!(
                requested = %operator,
                reported = %shown,
                "server evaluated with a different operator; labelling with the reported one"
            );
        }

        let mut view = assemble(
            &metrics.macro_metrics,
            &metrics.per_query,
            &success.plots,
            shown,
            self.messages(),
        );
        view.warning = metrics.error.clone();

        info!(
            queries = view.row_count(),
            plots = view.plots.len(),
            documents = success.documents_count.or(metrics.documents_count).unwrap_or_default(),
            digest = %view.digest().unwrap_or_default(),
            "assembled report"
        );
        view
    }

    /// Fetches metric documentation and opens the overlay. Never touches the
    /// in-flight guard or the loading indicator.
    pub async fn show_metrics_info(&self) -> Result<MetricsInfoView, TransportError> {
        match self.api.metrics_details().await {
            Ok(info) => {
                let view = metrics_info_view(&info, self.messages());
                info!(
                    metrics = view.entries.len(),
                    run_in_flight = self.is_running(),
                    "metrics info loaded"
                );
                let (event, replaced) = {
                    let mut state = self.state();
                    let replaced = state.modal_open();
                    (state.open_modal(view.clone()), replaced)
                };
                if replaced {
                    debug!("metrics info overlay refreshed");
                }
                self.publish([event]);
                Ok(view)
            }
            Err(err) => {
                warn!(error = %err, "metrics info request failed");
                let event = self
                    .state()
                    .show_side_error(self.messages().metrics_info_error.to_string());
                self.publish([event]);
                Err(err)
            }
        }
    }

    pub fn close_modal(&self) {
        let event = self.state().close_modal();
        self.publish(event);
    }

    /// A click that lands outside the modal surface dismisses it.
    pub fn click_outside_modal(&self) {
        self.close_modal();
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, events: impl IntoIterator<Item = ViewEvent>) {
        let Some(tx) = &self.events else {
            return;
        };
        for event in events {
            // receiver gone means nobody is rendering; state is still authoritative
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use indexmap::IndexMap;
    use reqwest::StatusCode;
    use tokio::sync::{mpsc, Notify};

    use super::{Controller, ControllerError};
    use crate::classify::{StatusTier, VisualTier};
    use crate::client::{EvaluationApi, TransportError};
    use crate::config::DashboardConfig;
    use crate::i18n::Locale;
    use crate::model::{
        EvaluationMetrics, EvaluationRequest, EvaluationResponse, EvaluationSuccess, MetricDoc,
        MetricSet, MetricsInfo, Operator, PlotSet, QueryMetrics,
    };
    use crate::report::Detailed;
    use crate::view::{Panel, Phase, ViewEvent};

    enum Script {
        Respond(EvaluationResponse),
        TransportFailure,
    }

    struct ScriptedApi {
        script: Script,
        docs: Option<MetricsInfo>,
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
        requests: std::sync::Mutex<Vec<EvaluationRequest>>,
    }

    impl ScriptedApi {
        fn new(script: Script) -> Self {
            Self {
                script,
                docs: None,
                gate: None,
                calls: AtomicUsize::new(0),
                requests: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn with_docs(mut self, docs: MetricsInfo) -> Self {
            self.docs = Some(docs);
            self
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EvaluationApi for ScriptedApi {
        async fn evaluate(
            &self,
            request: &EvaluationRequest,
        ) -> Result<EvaluationResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .expect("requests lock")
                .push(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.script {
                Script::Respond(response) => Ok(response.clone()),
                Script::TransportFailure => Err(TransportError::Status(StatusCode::BAD_GATEWAY)),
            }
        }

        async fn metrics_details(&self) -> Result<MetricsInfo, TransportError> {
            self.docs
                .clone()
                .ok_or(TransportError::Status(StatusCode::SERVICE_UNAVAILABLE))
        }
    }

    fn config(locale: Locale) -> DashboardConfig {
        DashboardConfig::default().with_locale(locale)
    }

    fn scenario_a() -> EvaluationResponse {
        let mut per_query = IndexMap::new();
        per_query.insert(
            "q1".to_string(),
            QueryMetrics {
                precision: 0.9,
                recall: 0.5,
                f_measure: 0.643,
                accuracy: 0.95,
                true_positive: 9,
                false_positive: 1,
                false_negative: 9,
                ..Default::default()
            },
        );
        EvaluationResponse::Success(Box::new(EvaluationSuccess {
            metrics: EvaluationMetrics {
                macro_metrics: MetricSet {
                    precision: 0.82,
                    recall: 0.65,
                    f_measure: 0.725,
                    accuracy: 0.9,
                },
                per_query,
                ..Default::default()
            },
            plots: PlotSet {
                precision_recall: Some("iVBORw0KGgo=".to_string()),
                metrics_comparison: None,
            },
            operator: Some("AND".to_string()),
            qrels_file: None,
            documents_count: Some(5),
        }))
    }

    fn failure(message: &str) -> EvaluationResponse {
        EvaluationResponse::Failure {
            message: message.to_string(),
            details: None,
        }
    }

    fn docs() -> MetricsInfo {
        let mut info = MetricsInfo::new();
        info.insert(
            "precision".to_string(),
            MetricDoc {
                name: "Precision".to_string(),
                description: "Share of relevant documents among retrieved".to_string(),
                formula: "Precision = TP / (TP + FP)".to_string(),
            },
        );
        info
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ViewEvent>) -> Vec<ViewEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn event_names(events: &[ViewEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|event| match event {
                ViewEvent::LoadingShown => "loading_shown",
                ViewEvent::ResultsShown(_) => "results_shown",
                ViewEvent::ErrorShown(_) => "error_shown",
                ViewEvent::NoticeShown(_) => "notice_shown",
                ViewEvent::LoadingHidden => "loading_hidden",
                ViewEvent::ModalOpened(_) => "modal_opened",
                ViewEvent::ModalClosed => "modal_closed",
            })
            .collect()
    }

    #[tokio::test]
    async fn scenario_a_renders_results_and_hides_loading_last() {
        let api = Arc::new(ScriptedApi::new(Script::Respond(scenario_a())));
        let mut controller = Controller::new(api.clone(), config(Locale::En));
        let mut rx = controller.subscribe();

        let phase = controller.run_evaluation().await.expect("run");
        let Phase::Results(view) = &phase else {
            panic!("expected results, got {phase:?}");
        };

        let values: Vec<&str> = view.cards.iter().map(|card| card.value.as_str()).collect();
        assert_eq!(values, vec!["0.820", "0.650", "0.725", "0.900"]);
        let tiers: Vec<VisualTier> = view.cards.iter().map(|card| card.tier).collect();
        assert_eq!(
            tiers,
            vec![
                VisualTier::High,
                VisualTier::Medium,
                VisualTier::High,
                VisualTier::High
            ]
        );
        assert_eq!(view.plots.len(), 1);
        let Detailed::Table { rows } = &view.detailed else {
            panic!("expected a table");
        };
        assert_eq!(rows[0].stats, "9/1/9");
        assert_eq!(rows[0].status, StatusTier::Good);

        assert_eq!(
            event_names(&drain(&mut rx)),
            vec!["loading_shown", "results_shown", "loading_hidden"]
        );
        assert_eq!(controller.phase(), phase);
        assert!(!controller.is_running());
        assert!(controller.modal().is_none());
        assert_eq!(
            controller.last_response().and_then(|last| last.documents_count),
            Some(5)
        );

        let requests = api.requests.lock().expect("requests lock");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].operator, Operator::And);
        assert_eq!(requests[0].qrels_file, "data/qrels.txt");
    }

    #[tokio::test]
    async fn scenario_b_shows_server_message_verbatim() {
        let api = Arc::new(ScriptedApi::new(Script::Respond(failure("qrels not found"))));
        let mut controller = Controller::new(api, config(Locale::Ru));
        let mut rx = controller.subscribe();

        let phase = controller.run_evaluation().await.expect("run");
        assert_eq!(phase, Phase::Error("qrels not found".to_string()));

        let events = drain(&mut rx);
        assert_eq!(
            event_names(&events),
            vec!["loading_shown", "error_shown", "loading_hidden"]
        );
        assert_eq!(
            events
                .iter()
                .filter(|event| **event == ViewEvent::LoadingHidden)
                .count(),
            1
        );
        assert!(controller.last_response().is_none());
    }

    #[tokio::test]
    async fn scenario_c_empty_per_query_renders_notice() {
        let response = EvaluationResponse::Success(Box::new(EvaluationSuccess {
            metrics: EvaluationMetrics {
                error: Some("qrels not loaded".to_string()),
                ..Default::default()
            },
            plots: PlotSet::default(),
            operator: None,
            qrels_file: None,
            documents_count: None,
        }));
        let api = Arc::new(ScriptedApi::new(Script::Respond(response)));
        let controller = Controller::new(api, config(Locale::En));

        let Phase::Results(view) = controller.run_evaluation().await.expect("run") else {
            panic!("expected results");
        };
        assert!(matches!(view.detailed, Detailed::Empty { .. }));
        assert!(view.plots.is_empty());
        assert_eq!(view.warning.as_deref(), Some("qrels not loaded"));
    }

    #[tokio::test]
    async fn transport_failure_uses_localized_message() {
        let api = Arc::new(ScriptedApi::new(Script::TransportFailure));
        let controller = Controller::new(api, config(Locale::Ru));

        let phase = controller.run_evaluation().await.expect("run");
        assert_eq!(
            phase,
            Phase::Error(Locale::Ru.messages().transport_error.to_string())
        );
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn cards_carry_the_operator_the_server_reports() {
        let EvaluationResponse::Success(mut success) = scenario_a() else {
            unreachable!();
        };
        success.operator = Some("OR".to_string());
        let api = Arc::new(ScriptedApi::new(Script::Respond(EvaluationResponse::Success(
            success,
        ))));
        let controller = Controller::new(api.clone(), config(Locale::En));

        let Phase::Results(view) = controller.run_evaluation().await.expect("run") else {
            panic!("expected results");
        };
        assert_eq!(view.operator, Operator::Or);
        assert!(view.cards.iter().all(|card| card.operator == Operator::Or));
        assert_eq!(
            api.requests.lock().expect("requests lock")[0].operator,
            Operator::And
        );
    }

    #[tokio::test]
    async fn unreported_operator_falls_back_to_requested() {
        let EvaluationResponse::Success(mut success) = scenario_a() else {
            unreachable!();
        };
        success.operator = None;
        let api = Arc::new(ScriptedApi::new(Script::Respond(EvaluationResponse::Success(
            success,
        ))));
        let controller = Controller::new(api, config(Locale::En));

        let Phase::Results(view) = controller
            .run_evaluation_with(Operator::Or)
            .await
            .expect("run")
        else {
            panic!("expected results");
        };
        assert_eq!(view.operator, Operator::Or);
    }

    #[tokio::test]
    async fn blank_server_message_falls_back_to_unknown_error() {
        let api = Arc::new(ScriptedApi::new(Script::Respond(failure("  "))));
        let controller = Controller::new(api, config(Locale::En));

        let phase = controller.run_evaluation().await.expect("run");
        assert_eq!(
            phase,
            Phase::Error(Locale::En.messages().unknown_server_error.to_string())
        );
    }

    #[tokio::test]
    async fn second_run_while_in_flight_is_rejected() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(ScriptedApi::new(Script::Respond(scenario_a())).gated(gate.clone()));
        let controller = Controller::new(api.clone(), config(Locale::En));

        let (first, second) = tokio::join!(controller.run_evaluation(), async {
            while api.calls() == 0 {
                tokio::task::yield_now().await;
            }
            assert_eq!(controller.phase(), Phase::Loading);
            assert!(controller.is_running());
            let second = controller.run_evaluation().await;
            gate.notify_one();
            second
        });

        assert!(matches!(first, Ok(Phase::Results(_))));
        assert!(matches!(second, Err(ControllerError::AlreadyRunning)));
        assert_eq!(api.calls(), 1);
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn guard_is_released_between_sequential_runs() {
        let api = Arc::new(ScriptedApi::new(Script::Respond(scenario_a())));
        let mut controller = Controller::new(api.clone(), config(Locale::En));
        let mut rx = controller.subscribe();

        controller.run_evaluation().await.expect("first run");
        controller
            .run_evaluation_with(Operator::Or)
            .await
            .expect("second run");

        assert_eq!(api.calls(), 2);
        assert_eq!(
            api.requests.lock().expect("requests lock")[1].operator,
            Operator::Or
        );
        assert_eq!(
            event_names(&drain(&mut rx)),
            vec![
                "loading_shown",
                "results_shown",
                "loading_hidden",
                "loading_shown",
                "results_shown",
                "loading_hidden"
            ]
        );
    }

    #[tokio::test]
    async fn metrics_info_opens_and_closes_modal() {
        let api = Arc::new(ScriptedApi::new(Script::Respond(scenario_a())).with_docs(docs()));
        let mut controller = Controller::new(api, config(Locale::En));
        let mut rx = controller.subscribe();

        let info = controller.show_metrics_info().await.expect("docs");
        assert_eq!(info.entries[0].formula, "Precision = TP / (TP + FP)");
        assert_eq!(controller.modal(), Some(info));
        assert_eq!(controller.phase(), Phase::Idle);

        controller.click_outside_modal();
        assert!(controller.modal().is_none());
        controller.close_modal();

        assert_eq!(
            event_names(&drain(&mut rx)),
            vec!["modal_opened", "modal_closed"]
        );
    }

    #[tokio::test]
    async fn metrics_info_failure_before_any_run_shows_fixed_error() {
        let api = Arc::new(ScriptedApi::new(Script::Respond(scenario_a())));
        let controller = Controller::new(api, config(Locale::En));

        let error = controller
            .show_metrics_info()
            .await
            .expect_err("docs should fail");
        assert!(matches!(error, TransportError::Status(_)));
        assert_eq!(
            controller.phase(),
            Phase::Error("Failed to load metric details.".to_string())
        );
        assert!(controller.modal().is_none());
        assert_eq!(controller.notice(), None);
    }

    #[tokio::test]
    async fn metrics_info_failure_keeps_results_on_screen() {
        let api = Arc::new(ScriptedApi::new(Script::Respond(scenario_a())));
        let mut controller = Controller::new(api, config(Locale::En));
        let mut rx = controller.subscribe();

        let settled = controller.run_evaluation().await.expect("run");
        assert!(matches!(settled, Phase::Results(_)));
        controller
            .show_metrics_info()
            .await
            .expect_err("docs should fail");

        assert_eq!(controller.phase(), settled);
        assert_eq!(
            controller.notice().as_deref(),
            Some("Failed to load metric details.")
        );
        assert!(controller.modal().is_none());
        assert_eq!(
            event_names(&drain(&mut rx)),
            vec!["loading_shown", "results_shown", "loading_hidden", "notice_shown"]
        );

        controller.run_evaluation().await.expect("second run");
        assert_eq!(controller.notice(), None);
    }

    #[tokio::test]
    async fn metrics_info_failure_leaves_inflight_loading_alone() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(ScriptedApi::new(Script::Respond(failure("boom"))).gated(gate.clone()));
        let controller = Controller::new(api.clone(), config(Locale::En));

        let (run, docs) = tokio::join!(controller.run_evaluation(), async {
            while api.calls() == 0 {
                tokio::task::yield_now().await;
            }
            let docs = controller.show_metrics_info().await;
            assert_eq!(controller.phase(), Phase::Loading);
            assert!(controller.is_running());
            gate.notify_one();
            docs
        });

        assert!(docs.is_err());
        assert_eq!(run.expect("run"), Phase::Error("boom".to_string()));
        assert_eq!(
            controller.state().visible_panel(),
            Some(Panel::ErrorBanner)
        );
    }
}
