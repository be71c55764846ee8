use std::fmt;
use std::time::Duration;

use bytes::Bytes;

/// Opaque handle for an in-memory download artifact.
pub type ArtifactId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub thumbnail: String,
    /// Length in whole seconds, when the backend knows it.
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Searching,
    Downloading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Why a backend request did not produce its success payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// HTTP 401: the session cookie is missing or no longer valid.
    Unauthorized { message: Option<String> },
    /// Any other non-success status; `message` is the backend's `error` field.
    Backend { status: u16, message: Option<String> },
    /// The service could not be reached or the response was unreadable.
    Transport { detail: String },
}

impl RequestFailure {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RequestFailure::Unauthorized { .. })
    }

    pub fn backend_message(&self) -> Option<&str> {
        match self {
            RequestFailure::Unauthorized { message } | RequestFailure::Backend { message, .. } => {
                message.as_deref().filter(|m| !m.trim().is_empty())
            }
            RequestFailure::Transport { .. } => None,
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestFailure::Unauthorized { .. } => write!(f, "unauthorized"),
            RequestFailure::Backend { status, message } => match message {
                Some(message) => write!(f, "backend status {status}: {message}"),
                None => write!(f, "backend status {status}"),
            },
            RequestFailure::Transport { detail } => write!(f, "transport failure: {detail}"),
        }
    }
}

/// Result of the startup session probe (`GET /api/me`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionProbe {
    pub logged_in: bool,
    pub username: Option<String>,
}

/// Successful login acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginReceipt {
    pub username: Option<String>,
}

/// Raw binary download response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub bytes: Bytes,
    pub content_disposition: Option<String>,
    pub content_type: Option<String>,
}

/// Outcome reported by the local save capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { location: String },
    Failed { reason: String },
}

/// Fixed delays of the post-download UX branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadTimings {
    /// Wait before deciding between "complete" and the manual fallback link.
    pub settle_delay: Duration,
    /// Wait after reporting completion before the artifact is released.
    pub release_grace: Duration,
}

impl Default for DownloadTimings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1500),
            release_grace: Duration::from_millis(5000),
        }
    }
}

/// Login form contents. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Device capability predicates supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceHints {
    pub mobile: bool,
    pub ios: bool,
}
