use std::fmt;

use bytes::Bytes;

/// `GET /api/me` answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionInfo {
    pub logged_in: bool,
    pub username: Option<String>,
}

/// `POST /api/info` answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub title: String,
    pub thumbnail: String,
    pub duration_secs: Option<u64>,
}

/// `POST /api/descargar` answer: raw bytes plus the headers the caller needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDownload {
    pub bytes: Bytes,
    pub content_disposition: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct ApiError {
    pub kind: FailureKind,
    /// The `error` field of the backend's JSON body, when there was one.
    pub server_message: Option<String>,
    pub detail: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            server_message: None,
            detail: detail.into(),
        }
    }

    pub(crate) fn with_server_message(mut self, message: Option<String>) -> Self {
        self.server_message = message;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// HTTP 401; the only authorization-failure signal.
    Unauthorized,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    InvalidResponse,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
