use reqwest::StatusCode;

/// Why a single symbol produced no record.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("rapidapi_key is required")]
    MissingApiKey,

    #[error("invalid value for header {0}")]
    InvalidHeader(&'static str),

    #[error("analytics base url cannot take path segments")]
    InvalidBaseUrl,

    #[error("analytics request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("analytics HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("analytics response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    UnexpectedShape(&'static str),
}

impl FetchError {
    /// Array or scalar payloads are skipped without being reported as failures.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, FetchError::UnexpectedShape(_))
    }
}
