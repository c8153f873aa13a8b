use thiserror::Error;

/// Errors surfaced by the screen automation collaborator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AutomationError {
    /// Element reference went stale between lookup and use
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    #[error("No such element: {0}")]
    NoSuchElement(String),

    /// The automation session is gone; nothing can be recovered locally
    #[error("Automation session lost: {0}")]
    SessionLost(String),

    #[error("Automation protocol error: {0}")]
    Protocol(String),

    #[error("Automation transport error: {0}")]
    Transport(String),
}

impl AutomationError {
    /// Errors that a single re-read is expected to clear
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AutomationError::StaleElement(_) | AutomationError::NoSuchElement(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, AutomationError::SessionLost(_))
    }
}

/// Errors from the external price API
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PriceApiError {
    #[error("Price API request failed: {0}")]
    Request(String),

    #[error("Price API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode price API response: {0}")]
    Decode(String),

    #[error("Invalid price API URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for PriceApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            PriceApiError::Decode(e.to_string())
        } else {
            PriceApiError::Request(e.to_string())
        }
    }
}

/// Errors reading or writing the JSON documents
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level error for a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Automation(#[from] AutomationError),

    #[error(transparent)]
    PriceApi(#[from] PriceApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Task '{task}' failed {failures} times in a row: {last_error}")]
    TooManyFailures {
        task: String,
        failures: u32,
        last_error: String,
    },
}

impl PipelineError {
    /// A fatal error ends the process; anything else may be retried on the next poll
    pub fn is_fatal(&self) -> bool {
        match self {
            PipelineError::Automation(e) => e.is_fatal(),
            PipelineError::TooManyFailures { .. } => true,
            _ => false,
        }
    }
}
