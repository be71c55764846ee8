use std::time::Duration;

use bytes::Bytes;

use crate::{ArtifactId, Credentials};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `GET /api/me`, answered with `Msg::SessionChecked`.
    CheckSession,
    /// `POST /api/login`, answered with `Msg::LoginFinished`.
    SubmitLogin(Credentials),
    /// `POST /api/logout`, best effort, answered with `Msg::LogoutFinished`.
    NotifyLogout,
    /// `POST /api/info` with a canonical URL, answered with `Msg::SearchFinished`.
    FetchMetadata { url: String },
    /// `POST /api/descargar` with a canonical URL, answered with `Msg::DownloadFinished`.
    FetchAudio { url: String },
    /// Persist bytes under the suggested name, answered with `Msg::ArtifactSaved`.
    SaveArtifact {
        artifact_id: ArtifactId,
        file_name: String,
        bytes: Bytes,
    },
    /// Post `Msg::SaveSettled` after `delay`.
    ScheduleSettle {
        artifact_id: ArtifactId,
        delay: Duration,
    },
    /// Post `Msg::ReleaseDue` after `delay`.
    ScheduleRelease {
        artifact_id: ArtifactId,
        delay: Duration,
    },
}

impl Effect {
    /// Short name for logs; never includes credentials or payload bytes.
    pub fn label(&self) -> &'static str {
        match self {
            Effect::CheckSession => "check_session",
            Effect::SubmitLogin(_) => "submit_login",
            Effect::NotifyLogout => "notify_logout",
            Effect::FetchMetadata { .. } => "fetch_metadata",
            Effect::FetchAudio { .. } => "fetch_audio",
            Effect::SaveArtifact { .. } => "save_artifact",
            Effect::ScheduleSettle { .. } => "schedule_settle",
            Effect::ScheduleRelease { .. } => "schedule_release",
        }
    }
}
