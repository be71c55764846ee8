use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use grab_logging::{grab_debug, grab_info};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::{ApiError, AudioDownload, FailureKind, SessionInfo, VideoInfo};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Covers the whole request, including the server-side conversion.
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            max_bytes: 512 * 1024 * 1024,
        }
    }
}

/// The conversion service's HTTP contract. Every call carries the session cookie.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `GET /api/me`
    async fn session_status(&self) -> Result<SessionInfo, ApiError>;
    /// `POST /api/login`; returns the username the server echoes back, if any.
    async fn login(&self, username: &str, password: &str) -> Result<Option<String>, ApiError>;
    /// `POST /api/logout`
    async fn logout(&self) -> Result<(), ApiError>;
    /// `POST /api/info`
    async fn video_info(&self, url: &str) -> Result<VideoInfo, ApiError>;
    /// `POST /api/descargar`
    async fn download_audio(&self, url: &str) -> Result<AudioDownload, ApiError>;
}

#[derive(Debug, Deserialize)]
struct MeBody {
    #[serde(rename = "loggedIn", default)]
    logged_in: bool,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoginBody {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfoBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Builds the shared client. The cookie store lives as long as the backend.
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.settings.base_url.trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(path)?;
        grab_debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await
    }

    async fn read_limited(&self, response: reqwest::Response) -> Result<Bytes, ApiError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes.freeze())
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn session_status(&self) -> Result<SessionInfo, ApiError> {
        let url = self.endpoint("/api/me")?;
        grab_debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let body: MeBody = response.json().await.map_err(map_body_error)?;
        Ok(SessionInfo {
            logged_in: body.logged_in,
            username: body.username,
        })
    }

    async fn login(&self, username: &str, password: &str) -> Result<Option<String>, ApiError> {
        let response = self
            .post_json(
                "/api/login",
                json!({ "username": username, "password": password }),
            )
            .await?;
        // The acknowledgement body is informational; a 2xx alone means success.
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed: LoginBody = serde_json::from_slice(&body).unwrap_or_default();
        grab_info!("login accepted for {}", username);
        Ok(parsed.username)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.post_json("/api/logout", json!({})).await?;
        Ok(())
    }

    async fn video_info(&self, url: &str) -> Result<VideoInfo, ApiError> {
        let response = self.post_json("/api/info", json!({ "url": url })).await?;
        let body: InfoBody = response.json().await.map_err(map_body_error)?;
        Ok(VideoInfo {
            title: body.title.unwrap_or_default(),
            thumbnail: body.thumbnail.unwrap_or_default(),
            duration_secs: body
                .duration
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(|secs| secs.round() as u64),
        })
    }

    async fn download_audio(&self, url: &str) -> Result<AudioDownload, ApiError> {
        let response = self
            .post_json("/api/descargar", json!({ "url": url }))
            .await?;
        let headers = response.headers();
        // Lossy so that raw UTF-8 file names in the header survive.
        let content_disposition = headers
            .get(CONTENT_DISPOSITION)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let bytes = self.read_limited(response).await?;
        grab_info!("downloaded {} bytes from {}", bytes.len(), url);
        Ok(AudioDownload {
            bytes,
            content_disposition,
            content_type,
        })
    }
}

/// Turns any non-2xx reply into an [`ApiError`], keeping the backend's `error` text.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(err) => {
            grab_debug!("could not read {} error body: {}", status, err);
            Bytes::new()
        }
    };
    let server_message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.error);
    let kind = if status == StatusCode::UNAUTHORIZED {
        FailureKind::Unauthorized
    } else {
        FailureKind::HttpStatus(status.as_u16())
    };
    Err(ApiError::new(kind, status.to_string()).with_server_message(server_message))
}

fn map_body_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        return ApiError::new(FailureKind::InvalidResponse, err.to_string());
    }
    map_reqwest_error(err)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
