//! HTTP API client for the prediction service endpoints.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

use crate::http_client::{self, Timeouts};
use crate::model::{AnalysisRequest, InputRecord, PredictionResult};

pub const DEFAULT_BASE_URL: &str = "https://salliemaeroi-service-119605585430.us-central1.run.app";

const INSTITUTIONS_PATH: &str = "get_universities";
const PREDICT_PATH: &str = "predict_roi";
const ANALYSIS_PATH: &str = "get_roi_analysis";
const HEALTH_PATH: &str = "health";

const MAX_INSTITUTIONS_RESPONSE_BYTES: usize = 4 * 1024 * 1024;
const MAX_PREDICTION_RESPONSE_BYTES: usize = 64 * 1024;
const MAX_ANALYSIS_RESPONSE_BYTES: usize = 256 * 1024;
const MAX_HEALTH_RESPONSE_BYTES: usize = 4 * 1024;
/// Error bodies are kept for diagnostics only, so they are clipped.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Operations offered by the prediction service.
///
/// Calls block; panels run them on worker threads.
pub trait PredictionService: Send + Sync {
    /// List institution names, in the order the service returns them.
    fn fetch_institutions(&self) -> Result<Vec<String>, ServiceError>;
    /// Predict income and loan metrics for one scenario.
    fn predict(&self, input: &InputRecord) -> Result<PredictionResult, ServiceError>;
    /// Produce a narrative analysis of a completed prediction.
    fn analyze(
        &self,
        input: &InputRecord,
        prediction: &PredictionResult,
    ) -> Result<String, ServiceError>;
    /// Probe the service health endpoint.
    fn check_health(&self) -> Result<HealthStatus, ServiceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("HTTP error: {0}")]
    Transport(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Health report from `/health`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[derive(Debug, Deserialize)]
struct InstitutionsResponse {
    universities: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    analysis: String,
}

/// Blocking HTTP implementation of [`PredictionService`].
#[derive(Clone, Debug)]
pub struct HttpPredictionService {
    base_url: Url,
    agent: ureq::Agent,
}

impl HttpPredictionService {
    /// Create a client rooted at `base_url`.
    ///
    /// Endpoint paths are resolved relative to the base, so a base with a
    /// path prefix (for example behind a proxy) keeps that prefix.
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, ServiceError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            agent: http_client::build_agent(timeouts),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|err| ServiceError::InvalidUrl(format!("{path}: {err}")))
    }

    fn get_text(&self, path: &str, max_bytes: usize) -> Result<String, ServiceError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "GET");
        let request = self
            .agent
            .get(url.as_str())
            .set("Accept", "application/json");
        finish(request.call(), max_bytes)
    }

    fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        max_bytes: usize,
    ) -> Result<String, ServiceError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "POST");
        let request = self
            .agent
            .post(url.as_str())
            .set("Accept", "application/json")
            .set("Content-Type", "application/json");
        finish(request.send_json(body), max_bytes)
    }
}

impl PredictionService for HttpPredictionService {
    fn fetch_institutions(&self) -> Result<Vec<String>, ServiceError> {
        let body = self.get_text(INSTITUTIONS_PATH, MAX_INSTITUTIONS_RESPONSE_BYTES)?;
        parse_institutions(&body)
    }

    fn predict(&self, input: &InputRecord) -> Result<PredictionResult, ServiceError> {
        let body = self.post_json(PREDICT_PATH, input, MAX_PREDICTION_RESPONSE_BYTES)?;
        parse_prediction(&body)
    }

    fn analyze(
        &self,
        input: &InputRecord,
        prediction: &PredictionResult,
    ) -> Result<String, ServiceError> {
        let request = AnalysisRequest { input, prediction };
        let body = self.post_json(ANALYSIS_PATH, &request, MAX_ANALYSIS_RESPONSE_BYTES)?;
        parse_analysis(&body)
    }

    fn check_health(&self) -> Result<HealthStatus, ServiceError> {
        let body = self.get_text(HEALTH_PATH, MAX_HEALTH_RESPONSE_BYTES)?;
        parse_json(&body)
    }
}

/// Validate a base URL and make sure relative joins keep its path.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ServiceError> {
    let mut url =
        Url::parse(raw.trim()).map_err(|err| ServiceError::InvalidUrl(format!("{raw}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ServiceError::InvalidUrl(format!(
            "{raw}: scheme must be http or https"
        )));
    }
    if url.cannot_be_a_base() {
        return Err(ServiceError::InvalidUrl(format!("{raw}: not a base URL")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn finish(
    outcome: Result<ureq::Response, ureq::Error>,
    max_bytes: usize,
) -> Result<String, ServiceError> {
    let response = match outcome {
        Ok(response) => response,
        Err(ureq::Error::Status(code, response)) => {
            let body = read_body_limited(response, max_bytes).unwrap_or_else(|err| err);
            return Err(ServiceError::Status {
                code,
                body: clip(&body, MAX_ERROR_BODY_CHARS),
            });
        }
        Err(ureq::Error::Transport(err)) => {
            return Err(ServiceError::Transport(err.to_string()));
        }
    };
    read_body_limited(response, max_bytes).map_err(ServiceError::Transport)
}

fn read_body_limited(response: ureq::Response, max_bytes: usize) -> Result<String, String> {
    http_client::read_response_text(response, max_bytes).map_err(|err| err.to_string())
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ServiceError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Decode("Empty response body".to_string()));
    }
    serde_json::from_str(trimmed).map_err(|err| {
        ServiceError::Decode(format!("{err}: {}", clip(trimmed, MAX_ERROR_BODY_CHARS)))
    })
}

fn parse_institutions(body: &str) -> Result<Vec<String>, ServiceError> {
    let parsed: InstitutionsResponse = parse_json(body)?;
    Ok(parsed.universities)
}

fn parse_prediction(body: &str) -> Result<PredictionResult, ServiceError> {
    parse_json(body)
}

fn parse_analysis(body: &str) -> Result<String, ServiceError> {
    let parsed: AnalysisResponse = parse_json(body)?;
    Ok(parsed.analysis)
}

fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}
