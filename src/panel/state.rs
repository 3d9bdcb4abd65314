use crate::model::{InputRecord, PredictionResult};

/// Everything one prediction panel shows: inputs, results, busy flags, errors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanelState {
    /// Current form inputs.
    pub input: InputRecord,
    /// Result of the last successful prediction for the current inputs.
    pub prediction: Option<PredictionResult>,
    /// Narrative derived from `prediction`.
    pub analysis: Option<String>,
    /// True while a prediction request is in flight.
    pub prediction_loading: bool,
    /// True while an analysis request is in flight.
    pub analysis_loading: bool,
    /// User-facing message from the last failed prediction.
    pub prediction_error: Option<String>,
    /// User-facing message from the last failed analysis.
    pub analysis_error: Option<String>,
}

impl PanelState {
    /// Drop the prediction along with everything derived from it.
    pub(super) fn clear_results(&mut self) {
        self.prediction = None;
        self.prediction_error = None;
        self.clear_analysis();
    }

    pub(super) fn clear_analysis(&mut self) {
        self.analysis = None;
        self.analysis_error = None;
        self.analysis_loading = false;
    }
}
