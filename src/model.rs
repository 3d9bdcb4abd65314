//! Input and result records exchanged with the prediction service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the five user-editable inputs of a prediction scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputField {
    DegreeType,
    MajorField,
    ControlType,
    State,
    InstitutionName,
}

impl InputField {
    /// Every field, in form order.
    pub const ALL: [InputField; 5] = [
        InputField::DegreeType,
        InputField::MajorField,
        InputField::ControlType,
        InputField::State,
        InputField::InstitutionName,
    ];

    /// Attribute name used in request payloads.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::DegreeType => "degree_type",
            Self::MajorField => "major_field",
            Self::ControlType => "control_type",
            Self::State => "state",
            Self::InstitutionName => "institution_name",
        }
    }

    /// Human-facing label for prompts and reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::DegreeType => "Degree Type",
            Self::MajorField => "Major Field",
            Self::ControlType => "School Type",
            Self::State => "State",
            Self::InstitutionName => "Institution",
        }
    }

    /// Resolve a field from its wire name, accepting `-` in place of `_`.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        let normalized = name.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|field| field.wire_name() == normalized)
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// The categorical inputs of one prediction scenario.
///
/// Missing keys deserialize as empty strings so partially filled scenario
/// files still load; [`InputRecord::is_complete`] decides submittability.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputRecord {
    pub degree_type: String,
    pub major_field: String,
    pub control_type: String,
    pub state: String,
    pub institution_name: String,
}

impl InputRecord {
    pub fn get(&self, field: InputField) -> &str {
        match field {
            InputField::DegreeType => &self.degree_type,
            InputField::MajorField => &self.major_field,
            InputField::ControlType => &self.control_type,
            InputField::State => &self.state,
            InputField::InstitutionName => &self.institution_name,
        }
    }

    pub fn set(&mut self, field: InputField, value: impl Into<String>) {
        let slot = match field {
            InputField::DegreeType => &mut self.degree_type,
            InputField::MajorField => &mut self.major_field,
            InputField::ControlType => &mut self.control_type,
            InputField::State => &mut self.state,
            InputField::InstitutionName => &mut self.institution_name,
        };
        *slot = value.into();
    }

    /// True when every field holds a non-empty value.
    pub fn is_complete(&self) -> bool {
        InputField::ALL
            .into_iter()
            .all(|field| !self.get(field).is_empty())
    }

    /// Fields that are still empty, in form order.
    pub fn missing_fields(&self) -> Vec<InputField> {
        InputField::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_empty())
            .collect()
    }
}

/// Estimated income and loan metrics returned by `/predict_roi`.
///
/// Currency amounts are plain dollars. `range_low <= predicted_income <=
/// range_high` is expected from the service but not checked here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_income: f64,
    pub range_low: f64,
    pub range_high: f64,
    pub annual_cost: f64,
    pub total_loan_amount: f64,
    pub monthly_payment: f64,
    pub total_interest_paid: f64,
    pub roi_percentage: f64,
    /// `None` when the service reports that the investment never breaks even.
    #[serde(default)]
    pub years_to_break_even: Option<f64>,
}

/// Flat payload sent to `/get_roi_analysis`: the inputs plus every result field.
#[derive(Debug, Serialize)]
pub(crate) struct AnalysisRequest<'a> {
    #[serde(flatten)]
    pub input: &'a InputRecord,
    #[serde(flatten)]
    pub prediction: &'a PredictionResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_record() -> InputRecord {
        InputRecord {
            degree_type: "Bachelor's Degree".into(),
            major_field: "Computer Science.".into(),
            control_type: "Public".into(),
            state: "TX".into(),
            institution_name: "University of Texas at Austin".into(),
        }
    }

    #[test]
    fn field_wire_names_round_trip() {
        for field in InputField::ALL {
            assert_eq!(InputField::from_wire_name(field.wire_name()), Some(field));
        }
        assert_eq!(
            InputField::from_wire_name("institution-name"),
            Some(InputField::InstitutionName)
        );
        assert_eq!(InputField::from_wire_name("gpa"), None);
    }

    #[test]
    fn missing_fields_follow_form_order() {
        let mut record = complete_record();
        record.set(InputField::State, "");
        record.set(InputField::DegreeType, "");
        assert!(!record.is_complete());
        assert_eq!(
            record.missing_fields(),
            vec![InputField::DegreeType, InputField::State]
        );
    }

    #[test]
    fn scenario_toml_with_missing_keys_loads_as_empty() {
        let record: InputRecord = toml::from_str("state = \"CA\"\n").unwrap();
        assert_eq!(record.state, "CA");
        assert!(record.degree_type.is_empty());
        assert!(!record.is_complete());
    }

    #[test]
    fn break_even_accepts_null_and_absent() {
        let base = r#""predicted_income": 1, "range_low": 1, "range_high": 1,
            "annual_cost": 1, "total_loan_amount": 1, "monthly_payment": 1,
            "total_interest_paid": 1, "roi_percentage": -3.5"#;
        let absent: PredictionResult = serde_json::from_str(&format!("{{{base}}}")).unwrap();
        assert_eq!(absent.years_to_break_even, None);
        let null: PredictionResult =
            serde_json::from_str(&format!("{{{base}, \"years_to_break_even\": null}}")).unwrap();
        assert_eq!(null.years_to_break_even, None);
        let set: PredictionResult =
            serde_json::from_str(&format!("{{{base}, \"years_to_break_even\": 4.25}}")).unwrap();
        assert_eq!(set.years_to_break_even, Some(4.25));
    }

    #[test]
    fn analysis_request_is_flat() {
        let input = complete_record();
        let prediction = PredictionResult {
            predicted_income: 60000.0,
            range_low: 50000.0,
            range_high: 70000.0,
            annual_cost: 10000.0,
            total_loan_amount: 40000.0,
            monthly_payment: 540.0,
            total_interest_paid: 24000.0,
            roi_percentage: 12.0,
            years_to_break_even: Some(6.5),
        };
        let value = serde_json::to_value(AnalysisRequest {
            input: &input,
            prediction: &prediction,
        })
        .unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 14);
        assert_eq!(object["state"], "TX");
        assert_eq!(object["roi_percentage"], 12.0);
        assert_eq!(object["years_to_break_even"], 6.5);
    }
}
