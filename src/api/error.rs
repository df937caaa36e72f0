/// Failure of a single exchange with the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(String),
}

/// Errors of the remote object API.
///
/// Both kinds end the user action that triggered the request: nothing is
/// retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("malformed payload: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn status(code: u16) -> Self {
        Self::Transport(TransportError::Status(code))
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        Self::Parse(detail.into())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::status(status.as_u16())
        } else {
            Self::Transport(TransportError::Request(err.to_string()))
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<base64::DecodeError> for ApiError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Parse(format!("document data: {err}"))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
