//! Option lists offered for the categorical inputs.
//!
//! Panels receive these at construction instead of reading globals, so tests
//! and alternate deployments can swap in their own lists. Institution names
//! are not part of this set; they come from the service at runtime.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::InputField;

const BUILTIN_MAJORS: &str = include_str!("../assets/reference/majors.txt");

const BUILTIN_DEGREE_TYPES: [&str; 5] = [
    "Associate's Degree",
    "Bachelor's Degree",
    "Doctoral Degree",
    "First Professional Degree",
    "Master's Degree",
];

const BUILTIN_CONTROL_TYPES: [&str; 4] = [
    "Foreign",
    "Private, for-profit",
    "Private, nonprofit",
    "Public",
];

const BUILTIN_STATES: [&str; 58] = [
    "AK", "AL", "AR", "AS", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "FM", "GA", "GU", "HI", "IA",
    "ID", "IL", "IN", "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MP", "MS", "MT", "NC",
    "ND", "NE", "NH", "NJ", "NM", "NV", "NY", "OH", "OK", "OR", "PA", "PR", "PW", "RI", "SC", "SD",
    "TN", "TX", "UT", "VA", "VI", "VT", "WA", "WI", "WV", "WY",
];

/// Errors raised while loading a reference data file.
#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("Failed to read reference data {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid reference data at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Reference data at {path} has an empty `{list}` list")]
    EmptyList { path: PathBuf, list: &'static str },
}

/// Static option lists for every field except the institution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub degree_types: Vec<String>,
    pub majors: Vec<String>,
    pub control_types: Vec<String>,
    pub states: Vec<String>,
}

impl ReferenceData {
    /// The lists shipped with the crate.
    pub fn builtin() -> Self {
        Self {
            degree_types: to_owned(&BUILTIN_DEGREE_TYPES),
            majors: BUILTIN_MAJORS
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            control_types: to_owned(&BUILTIN_CONTROL_TYPES),
            states: to_owned(&BUILTIN_STATES),
        }
    }

    /// Load replacement lists from a TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self, ReferenceDataError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReferenceDataError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let data: Self = toml::from_str(&text).map_err(|source| ReferenceDataError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(list) = data.first_empty_list() {
            return Err(ReferenceDataError::EmptyList {
                path: path.to_path_buf(),
                list,
            });
        }
        Ok(data)
    }

    /// Options for a field, or `None` for the institution, which is fetched.
    pub fn options(&self, field: InputField) -> Option<&[String]> {
        match field {
            InputField::DegreeType => Some(&self.degree_types),
            InputField::MajorField => Some(&self.majors),
            InputField::ControlType => Some(&self.control_types),
            InputField::State => Some(&self.states),
            InputField::InstitutionName => None,
        }
    }

    /// Whether `value` is one of the listed options.
    ///
    /// Fields without a static list accept anything.
    pub fn is_known(&self, field: InputField, value: &str) -> bool {
        self.options(field)
            .is_none_or(|options| options.iter().any(|option| option == value))
    }

    fn first_empty_list(&self) -> Option<&'static str> {
        [
            ("degree_types", &self.degree_types),
            ("majors", &self.majors),
            ("control_types", &self.control_types),
            ("states", &self.states),
        ]
        .into_iter()
        .find(|(_, list)| list.is_empty())
        .map(|(name, _)| name)
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::builtin()
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builtin_lists_are_populated() {
        let data = ReferenceData::builtin();
        assert_eq!(data.degree_types.len(), 5);
        assert_eq!(data.control_types.len(), 4);
        assert_eq!(data.states.len(), 58);
        assert!(data.majors.len() > 300);
        assert!(data.majors.iter().any(|major| major == "Computer Science."));
        assert!(data.majors.iter().all(|major| !major.is_empty()));
    }

    #[test]
    fn institution_has_no_static_options() {
        let data = ReferenceData::builtin();
        assert!(data.options(InputField::InstitutionName).is_none());
        assert!(data.is_known(InputField::InstitutionName, "Anything At All"));
        assert!(data.is_known(InputField::State, "WY"));
        assert!(!data.is_known(InputField::State, "ZZ"));
    }

    #[test]
    fn loads_small_fixture_from_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reference.toml");
        std::fs::write(
            &path,
            r#"
degree_types = ["Bachelor's Degree"]
majors = ["History."]
control_types = ["Public"]
states = ["VT"]
"#,
        )
        .unwrap();
        let data = ReferenceData::load_from_path(&path).unwrap();
        assert_eq!(data.majors, vec!["History."]);
        assert!(!data.is_known(InputField::State, "TX"));
    }

    #[test]
    fn rejects_empty_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reference.toml");
        std::fs::write(
            &path,
            "degree_types = [\"A\"]\nmajors = []\ncontrol_types = [\"B\"]\nstates = [\"C\"]\n",
        )
        .unwrap();
        let err = ReferenceData::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ReferenceDataError::EmptyList { list: "majors", .. }));
    }
}
