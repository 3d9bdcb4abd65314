//! Client for the external college ROI prediction service.

pub mod api;

pub use api::{
    DEFAULT_BASE_URL, HealthStatus, HttpPredictionService, PredictionService, ServiceError,
};
