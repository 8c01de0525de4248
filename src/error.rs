use std::fmt;

use axum::http::StatusCode;
use lazy_static::lazy_static;
use regex::Regex;

use crate::gemini::ClientError;

/// Why a single candidate model did not yield a plan.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("model returned no text")]
    EmptyResponse,
    #[error("model returned malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Classification of the last failed attempt once every candidate is spent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    QuotaExceeded,
    AccessDenied,
    Other(String),
    NoCandidates,
}

impl GenerationFailure {
    pub fn classify(err: &AttemptError) -> Self {
        lazy_static! {
            static ref QUOTA_RE: Regex = Regex::new(r"\b429\b|RESOURCE_EXHAUSTED").unwrap();
            static ref DENIED_RE: Regex = Regex::new(r"\b403\b|PERMISSION_DENIED").unwrap();
        }
        if let AttemptError::Client(ClientError::Status { status, .. }) = err {
            if *status == StatusCode::TOO_MANY_REQUESTS {
                return GenerationFailure::QuotaExceeded;
            }
            if *status == StatusCode::FORBIDDEN {
                return GenerationFailure::AccessDenied;
            }
        }
        let message = err.to_string();
        if QUOTA_RE.is_match(&message) {
            GenerationFailure::QuotaExceeded
        } else if DENIED_RE.is_match(&message) {
            GenerationFailure::AccessDenied
        } else {
            GenerationFailure::Other(message)
        }
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationFailure::QuotaExceeded => f.write_str(" (Daily Quota Exceeded)"),
            GenerationFailure::AccessDenied => f.write_str(" (Access Denied)"),
            GenerationFailure::Other(msg) => write!(f, " ({})", msg),
            GenerationFailure::NoCandidates => Ok(()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("API key is missing. Please ensure you have added 'API_KEY' to the server environment or its .env file.")]
    Configuration,
    #[error("{0}")]
    InvalidSettings(String),
    #[error("Failed to generate meal plan after multiple attempts.{0}")]
    Generation(GenerationFailure),
}

impl PlanError {
    pub fn status(&self) -> StatusCode {
        match self {
            PlanError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            PlanError::InvalidSettings(_) => StatusCode::BAD_REQUEST,
            PlanError::Generation(_) => StatusCode::BAD_GATEWAY,
        }
    }
}
