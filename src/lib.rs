//! Client for an external college ROI prediction service.
//!
//! A [`panel::PredictionPanel`] holds one scenario's inputs and drives the
//! prediction and analysis requests for it; a
//! [`comparison::ComparisonCoordinator`] runs two panels side by side.

/// Application directory resolution.
pub mod app_dirs;
/// Command-line front end.
pub mod cli;
/// Pairwise comparison of two panels.
pub mod comparison;
/// TOML settings.
pub mod config;
/// Display helpers for currency and percentages.
pub mod format;
pub(crate) mod http_client;
/// Institution list fetched from the service.
pub mod institutions;
/// Tracing setup.
pub mod logging;
/// Input and result records.
pub mod model;
/// Single-scenario request orchestration.
pub mod panel;
/// Option lists for the categorical inputs.
pub mod reference_data;
/// Prediction service client.
pub mod service;

pub use http_client::Timeouts;
