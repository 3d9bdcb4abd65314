//! One independent prediction scenario: inputs, background requests, results.
//!
//! Requests run on worker threads and report back over a channel that the
//! owning thread drains with [`PredictionPanel::poll`]. Each submission is
//! tagged with a request token; editing an input or submitting again advances
//! the token, and completions carrying an older token are dropped so a late
//! response can never land on inputs it was not computed for.

mod jobs;
mod state;

use std::sync::Arc;
use std::sync::mpsc::TryRecvError;

use crate::model::{InputField, InputRecord, PredictionResult};
use crate::reference_data::ReferenceData;
use crate::service::PredictionService;

use jobs::{AnalysisJobResult, PanelJobMessage, PanelJobs, PredictionJobResult};
pub use state::PanelState;

/// Shown when a prediction request fails for any reason.
pub const PREDICTION_ERROR_MESSAGE: &str = "Failed to get prediction. Please try again.";
/// Shown when an analysis request fails for any reason.
pub const ANALYSIS_ERROR_MESSAGE: &str = "Failed to generate AI analysis. Please try again.";

pub struct PredictionPanel {
    label: String,
    reference: Arc<ReferenceData>,
    state: PanelState,
    jobs: PanelJobs,
}

impl PredictionPanel {
    pub fn new(
        label: impl Into<String>,
        service: Arc<dyn PredictionService>,
        reference: Arc<ReferenceData>,
    ) -> Self {
        Self {
            label: label.into(),
            reference,
            state: PanelState::default(),
            jobs: PanelJobs::new(service),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn reference_data(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn input(&self) -> &InputRecord {
        &self.state.input
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.state.prediction.as_ref()
    }

    pub fn analysis(&self) -> Option<&str> {
        self.state.analysis.as_deref()
    }

    /// Store one input and discard every result computed for the old inputs.
    ///
    /// Requests still in flight are orphaned: their busy flags are released
    /// and their completions will be ignored.
    pub fn set_field(&mut self, field: InputField, value: impl Into<String>) {
        self.state.input.set(field, value);
        self.state.clear_results();
        if self.state.prediction_loading {
            tracing::debug!(panel = %self.label, "Input changed; dropping in-flight prediction");
        }
        self.state.prediction_loading = false;
        self.jobs.advance();
    }

    /// Replace every input at once, with the same clearing as [`Self::set_field`].
    pub fn set_input(&mut self, input: InputRecord) {
        for field in InputField::ALL {
            self.set_field(field, input.get(field));
        }
    }

    /// True when every input is filled in.
    pub fn is_submittable(&self) -> bool {
        self.state.input.is_complete()
    }

    pub fn is_busy(&self) -> bool {
        self.state.prediction_loading || self.state.analysis_loading
    }

    /// Start a prediction for the current inputs.
    ///
    /// Returns `false` without touching state when the inputs are incomplete
    /// or a prediction is already running.
    pub fn submit_prediction(&mut self) -> bool {
        if !self.is_submittable() || self.state.prediction_loading {
            tracing::debug!(panel = %self.label, "Prediction submit skipped");
            return false;
        }
        let token = self.jobs.advance();
        self.state.clear_results();
        self.state.prediction_loading = true;
        tracing::info!(
            panel = %self.label,
            institution = %self.state.input.institution_name,
            "Requesting prediction"
        );
        self.jobs.begin_prediction(token, self.state.input.clone());
        true
    }

    /// Ask for a narrative analysis of the held prediction.
    ///
    /// Returns `false` without touching state when there is no prediction or
    /// an analysis is already running.
    pub fn request_analysis(&mut self) -> bool {
        if self.state.analysis_loading {
            return false;
        }
        let Some(prediction) = self.state.prediction.clone() else {
            return false;
        };
        self.state.analysis_loading = true;
        self.state.analysis_error = None;
        tracing::info!(panel = %self.label, "Requesting analysis");
        self.jobs.begin_analysis(
            self.jobs.current_token(),
            self.state.input.clone(),
            prediction,
        );
        true
    }

    /// Apply every finished request without blocking. Returns true if state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.jobs.try_recv_message() {
                Ok(message) => changed |= self.apply_message(message),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    /// Block until no request of this panel is in flight.
    pub fn wait_until_idle(&mut self) {
        while self.is_busy() {
            match self.jobs.recv_message() {
                Ok(message) => {
                    self.apply_message(message);
                }
                Err(_) => break,
            }
        }
    }

    fn apply_message(&mut self, message: PanelJobMessage) -> bool {
        match message {
            PanelJobMessage::PredictionFinished(message) => self.apply_prediction(message),
            PanelJobMessage::AnalysisFinished(message) => self.apply_analysis(message),
        }
    }

    fn apply_prediction(&mut self, message: PredictionJobResult) -> bool {
        if !self.jobs.is_current(message.token) {
            tracing::debug!(panel = %self.label, token = ?message.token, "Discarding stale prediction");
            return false;
        }
        self.state.prediction_loading = false;
        match message.result {
            Ok(prediction) => {
                self.state.prediction = Some(prediction);
                self.state.prediction_error = None;
            }
            Err(err) => {
                tracing::warn!(panel = %self.label, "Prediction error: {err}");
                self.state.prediction = None;
                self.state.prediction_error = Some(PREDICTION_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    fn apply_analysis(&mut self, message: AnalysisJobResult) -> bool {
        if !self.jobs.is_current(message.token) {
            tracing::debug!(panel = %self.label, token = ?message.token, "Discarding stale analysis");
            return false;
        }
        self.state.analysis_loading = false;
        match message.result {
            Ok(text) => {
                self.state.analysis = Some(text);
                self.state.analysis_error = None;
            }
            Err(err) => {
                tracing::warn!(panel = %self.label, "Analysis error: {err}");
                self.state.analysis = None;
                self.state.analysis_error = Some(ANALYSIS_ERROR_MESSAGE.to_string());
            }
        }
        true
    }
}
