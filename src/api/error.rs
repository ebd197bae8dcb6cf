use thiserror::Error;

/// Fallback message when the backend gives no usable `detail`.
pub const GENERIC_FAILURE: &str = "API request failed";

/// Failures talking to the portal backend. `Display` is the text shown to the user.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 from the backend. The stored session is no longer valid.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{detail}")]
    Status { status: u16, detail: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}
