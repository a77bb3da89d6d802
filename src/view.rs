//! Dashboard view state: one main phase plus the metrics-info overlay.
//!
//! The phase enum makes loading, results and error mutually exclusive. A run
//! leaves `Loading` through a single `settle` call, so the loading indicator
//! disappears exactly once and only after the outcome is known.

use thiserror::Error;

use crate::report::{MetricsInfoView, ViewModel};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Results(Box<ViewModel>),
    Error(String),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Results(_) => "results",
            Self::Error(_) => "error",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Panel {
    LoadingIndicator,
    Results,
    ErrorBanner,
}

/// Published to front ends in the order transitions happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    LoadingShown,
    ResultsShown(Box<ViewModel>),
    ErrorShown(String),
    /// Side-channel failure shown next to whatever panel is up.
    NoticeShown(String),
    LoadingHidden,
    ModalOpened(MetricsInfoView),
    ModalClosed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("cannot settle a run while the view is {0}")]
    NotLoading(&'static str),
    #[error("settled phase must be results or error, got {0}")]
    InvalidOutcome(&'static str),
}

#[derive(Debug, Default)]
pub struct ViewState {
    phase: Phase,
    modal: Option<MetricsInfoView>,
    notice: Option<String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn modal(&self) -> Option<&MetricsInfoView> {
        self.modal.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn modal_open(&self) -> bool {
        self.modal.is_some()
    }

    pub fn visible_panel(&self) -> Option<Panel> {
        match self.phase {
            Phase::Idle => None,
            Phase::Loading => Some(Panel::LoadingIndicator),
            Phase::Results(_) => Some(Panel::Results),
            Phase::Error(_) => Some(Panel::ErrorBanner),
        }
    }

    /// Enters `Loading`, dropping whatever results or error were on screen.
    pub fn begin_loading(&mut self) -> Vec<ViewEvent> {
        self.phase = Phase::Loading;
        self.notice = None;
        vec![ViewEvent::LoadingShown]
    }

    /// Replaces `Loading` with the run outcome.
    pub fn settle(&mut self, outcome: Phase) -> Result<Vec<ViewEvent>, ViewError> {
        if self.phase != Phase::Loading {
            return Err(ViewError::NotLoading(self.phase.name()));
        }

        let shown = match &outcome {
            Phase::Results(view) => ViewEvent::ResultsShown(view.clone()),
            Phase::Error(message) => ViewEvent::ErrorShown(message.clone()),
            other => return Err(ViewError::InvalidOutcome(other.name())),
        };

        self.phase = outcome;
        Ok(vec![shown, ViewEvent::LoadingHidden])
    }

    /// Error raised outside a run. It becomes the main panel only when nothing
    /// else is on screen; over loading, results or a run error it is a notice.
    pub fn show_side_error(&mut self, message: String) -> ViewEvent {
        if self.phase == Phase::Idle {
            self.phase = Phase::Error(message.clone());
            return ViewEvent::ErrorShown(message);
        }
        self.notice = Some(message.clone());
        ViewEvent::NoticeShown(message)
    }

    pub fn open_modal(&mut self, info: MetricsInfoView) -> ViewEvent {
        self.modal = Some(info.clone());
        ViewEvent::ModalOpened(info)
    }

    pub fn close_modal(&mut self) -> Option<ViewEvent> {
        self.modal.take().map(|_| ViewEvent::ModalClosed)
    }
}
