use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: StatusCode },
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("operation was canceled")]
    Canceled,
    #[error("no games found in API response")]
    EmptyCatalog,
    #[error("expected JSON property missing: {0}")]
    MissingProperty(String),
    #[error("no prize tiers found for game ID {0}")]
    NoPrizeTiers(i64),
}

impl FetchError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, FetchError::Canceled)
    }
}
