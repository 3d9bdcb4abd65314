use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use degree_roi::model::{InputField, InputRecord, PredictionResult};
use degree_roi::reference_data::ReferenceData;
use degree_roi::service::{HealthStatus, PredictionService, ServiceError};

/// In-memory service keyed by institution name.
///
/// Institutions without a canned prediction fail with a transport error.
/// A gate holds a prediction back until the test releases it.
#[derive(Default)]
pub struct FakeService {
    institutions: Mutex<Option<Vec<String>>>,
    predictions: Mutex<HashMap<String, PredictionResult>>,
    gates: Mutex<HashMap<String, Receiver<()>>>,
    analysis: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prediction(self, institution: &str, prediction: PredictionResult) -> Self {
        self.predictions
            .lock()
            .unwrap()
            .insert(institution.to_string(), prediction);
        self
    }

    pub fn with_analysis(self, text: &str) -> Self {
        *self.analysis.lock().unwrap() = Some(text.to_string());
        self
    }

    pub fn with_institutions(self, names: &[&str]) -> Self {
        *self.institutions.lock().unwrap() =
            Some(names.iter().map(|name| name.to_string()).collect());
        self
    }

    /// Hold predictions for `institution` until the returned sender fires.
    pub fn gate(&self, institution: &str) -> Sender<()> {
        let (tx, rx) = mpsc::channel();
        self.gates
            .lock()
            .unwrap()
            .insert(institution.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PredictionService for FakeService {
    fn fetch_institutions(&self) -> Result<Vec<String>, ServiceError> {
        self.record("institutions".to_string());
        self.institutions
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ServiceError::Transport("connection refused".to_string()))
    }

    fn predict(&self, input: &InputRecord) -> Result<PredictionResult, ServiceError> {
        self.record(format!("predict:{}", input.institution_name));
        let gate = self.gates.lock().unwrap().remove(&input.institution_name);
        if let Some(gate) = gate {
            let _ = gate.recv();
        }
        self.predictions
            .lock()
            .unwrap()
            .get(&input.institution_name)
            .cloned()
            .ok_or_else(|| ServiceError::Transport("connection refused".to_string()))
    }

    fn analyze(
        &self,
        input: &InputRecord,
        _prediction: &PredictionResult,
    ) -> Result<String, ServiceError> {
        self.record(format!("analyze:{}", input.institution_name));
        self.analysis
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ServiceError::Status {
                code: 500,
                body: "analysis unavailable".to_string(),
            })
    }

    fn check_health(&self) -> Result<HealthStatus, ServiceError> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
        })
    }
}

pub fn prediction(roi: f64, income: f64, loan: f64) -> PredictionResult {
    PredictionResult {
        predicted_income: income,
        range_low: income - 8000.0,
        range_high: income + 8000.0,
        annual_cost: loan / 4.0,
        total_loan_amount: loan,
        monthly_payment: loan / 74.0,
        total_interest_paid: loan * 0.62,
        roi_percentage: roi,
        years_to_break_even: Some(6.4),
    }
}

pub fn scenario(institution: &str) -> InputRecord {
    let mut input = InputRecord::default();
    input.set(InputField::DegreeType, "Bachelor's Degree");
    input.set(InputField::MajorField, "Computer Science.");
    input.set(InputField::ControlType, "Public");
    input.set(InputField::State, "WA");
    input.set(InputField::InstitutionName, institution);
    input
}

pub fn reference() -> Arc<ReferenceData> {
    Arc::new(ReferenceData {
        degree_types: vec!["Bachelor's Degree".to_string()],
        majors: vec!["Computer Science.".to_string()],
        control_types: vec!["Public".to_string()],
        states: vec!["WA".to_string()],
    })
}
