use crate::{
    ArtifactId, AudioPayload, Credentials, DeviceHints, LoginReceipt, RequestFailure, SaveOutcome,
    SessionProbe, VideoMetadata,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Process start; triggers the one-time session probe.
    Started,
    /// Startup probe result.
    SessionChecked(Result<SessionProbe, RequestFailure>),
    /// User submitted the login form.
    LoginSubmitted(Credentials),
    /// Login request result.
    LoginFinished(Result<LoginReceipt, RequestFailure>),
    /// User clicked logout.
    LogoutClicked,
    /// Logout notification result (ignored apart from the response hook).
    LogoutFinished(Result<(), RequestFailure>),
    /// User edited the URL input box.
    UrlEdited(String),
    /// User asked for the video metadata of the current input.
    SearchSubmitted,
    /// Metadata request result.
    SearchFinished(Result<VideoMetadata, RequestFailure>),
    /// User asked for the audio file.
    DownloadRequested(DeviceHints),
    /// Binary download result.
    DownloadFinished(Result<AudioPayload, RequestFailure>),
    /// The local save capability finished with the given outcome.
    ArtifactSaved {
        artifact_id: ArtifactId,
        outcome: SaveOutcome,
    },
    /// Settle delay elapsed after the automatic save attempt.
    SaveSettled { artifact_id: ArtifactId },
    /// Grace period elapsed; the artifact may be released.
    ReleaseDue { artifact_id: ArtifactId },
    /// User used the manual fallback link.
    ManualSaveRequested,
}

impl Msg {
    /// Short name for logs; never includes credentials or payload bytes.
    pub fn label(&self) -> &'static str {
        match self {
            Msg::Started => "started",
            Msg::SessionChecked(_) => "session_checked",
            Msg::LoginSubmitted(_) => "login_submitted",
            Msg::LoginFinished(_) => "login_finished",
            Msg::LogoutClicked => "logout_clicked",
            Msg::LogoutFinished(_) => "logout_finished",
            Msg::UrlEdited(_) => "url_edited",
            Msg::SearchSubmitted => "search_submitted",
            Msg::SearchFinished(_) => "search_finished",
            Msg::DownloadRequested(_) => "download_requested",
            Msg::DownloadFinished(_) => "download_finished",
            Msg::ArtifactSaved { .. } => "artifact_saved",
            Msg::SaveSettled { .. } => "save_settled",
            Msg::ReleaseDue { .. } => "release_due",
            Msg::ManualSaveRequested => "manual_save_requested",
        }
    }
}
