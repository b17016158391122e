use thiserror::Error;

/// Shown when the defensive re-check at submit time fails.
pub const VALIDATION_FAILED_MESSAGE: &str = "Input validation failed. Input should meet constraints";

const UNEXPECTED_ERROR_PREFIX: &str = "Unexpected error: Please contact support!. Error code:";

/// Error code shown when the failure carried no HTTP status.
pub const UNKNOWN_STATUS: &str = "undefined";

/// Failure of the outbound registration call.
///
/// Covers both network failures (`status` is `None`) and non-2xx responses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Registration request failed: {message}")]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
    /// Raw `Set-Cookie` values of a non-2xx response.
    pub set_cookies: Vec<String>,
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            set_cookies: Vec::new(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            set_cookies: Vec::new(),
        }
    }

    pub fn with_set_cookies(mut self, set_cookies: Vec<String>) -> Self {
        self.set_cookies = set_cookies;
        self
    }
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RegisterError {
    /// Text displayed to the user for this failure.
    ///
    /// Transport failures are not distinguished by cause; only the status
    /// code is surfaced.
    pub fn user_message(&self) -> String {
        match self {
            RegisterError::Validation(_) => VALIDATION_FAILED_MESSAGE.to_string(),
            RegisterError::Transport(err) => {
                let code = err
                    .status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| UNKNOWN_STATUS.to_string());
                format!("{}{}", UNEXPECTED_ERROR_PREFIX, code)
            }
        }
    }
}
