use bytes::Bytes;

use crate::artifact::ArtifactLifecycle;
use crate::session::SessionGate;
use crate::view_model::{format_duration, AppViewModel, ManualDownloadView, MetadataView, SessionView};
use crate::{
    ArtifactId, DeviceHints, DownloadTimings, RequestPhase, SaveOutcome, StatusMessage,
    VideoMetadata,
};

pub const SEARCHING_MESSAGE: &str = "Searching for video information...";
pub const DOWNLOADING_MESSAGE: &str = "Downloading...";
pub const DOWNLOAD_COMPLETE_MESSAGE: &str = "Download complete!";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";
pub const MANUAL_FALLBACK_MESSAGE: &str =
    "If the download did not start automatically, use the link below.";
pub const MANUAL_FALLBACK_IOS_MESSAGE: &str = "On iPhone/iPad: if the download did not start \
     automatically, use the link below. If a player opens, long-press it and choose \
     \"Share\" → \"Save to Files\".";

/// Download whose automatic save is waiting for the settle delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingSettle {
    pub(crate) artifact_id: ArtifactId,
    pub(crate) hints: DeviceHints,
}

/// Artifact kept alive and offered as a manual save link (mobile only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ManualDownload {
    pub(crate) artifact_id: ArtifactId,
    pub(crate) ios: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) session: SessionGate,
    url_input: String,
    phase: RequestPhase,
    status: Option<StatusMessage>,
    metadata: Option<VideoMetadata>,
    pub(crate) artifacts: ArtifactLifecycle,
    hints: DeviceHints,
    pending_settle: Option<PendingSettle>,
    manual: Option<ManualDownload>,
    last_saved: Option<SaveOutcome>,
    timings: DownloadTimings,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timings(timings: DownloadTimings) -> Self {
        Self {
            timings,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let idle = self.phase == RequestPhase::Idle;
        let ready = self.session.authenticated() && idle;
        let has_input = !self.url_input.trim().is_empty();
        AppViewModel {
            session: SessionView {
                checking: self.session.checking(),
                authenticated: self.session.authenticated(),
                username: self.session.username().map(ToOwned::to_owned),
            },
            url_input: self.url_input.clone(),
            phase: self.phase,
            status: self.status.clone(),
            metadata: self.metadata.as_ref().map(|meta| MetadataView {
                title: meta.title.clone(),
                thumbnail: meta.thumbnail.clone(),
                duration_label: meta.duration.map(format_duration),
            }),
            manual_download: self.manual_download_view(),
            live_artifacts: self.artifacts.live_count(),
            released_artifacts: self.artifacts.released_count(),
            last_saved: self.last_saved.clone(),
            input_enabled: ready,
            search_enabled: ready && has_input,
            download_enabled: ready && has_input && self.metadata.is_some(),
        }
    }

    pub fn url_input(&self) -> &str {
        &self.url_input
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    pub fn session(&self) -> &SessionGate {
        &self.session
    }

    pub fn artifacts(&self) -> &ArtifactLifecycle {
        &self.artifacts
    }

    pub fn timings(&self) -> DownloadTimings {
        self.timings
    }

    fn manual_download_view(&self) -> Option<ManualDownloadView> {
        let manual = self.manual.as_ref()?;
        let artifact = self.artifacts.live().filter(|a| a.id == manual.artifact_id)?;
        Some(ManualDownloadView {
            artifact_id: artifact.id,
            file_name: artifact.file_name.clone(),
            ios: manual.ios,
        })
    }

    pub(crate) fn set_status(&mut self, status: Option<StatusMessage>) {
        self.status = status;
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.phase == RequestPhase::Idle
    }

    /// Only one request at a time, and only for a signed-in user.
    pub(crate) fn can_start_request(&self) -> bool {
        self.session.authenticated() && self.is_idle()
    }

    /// Clears every piece of per-user data. Keeps the URL input.
    pub(crate) fn clear_user_data(&mut self) {
        self.metadata = None;
        self.drop_artifact();
    }

    fn drop_artifact(&mut self) {
        self.artifacts.release();
        self.pending_settle = None;
        self.manual = None;
    }

    /// Applies a URL edit. Returns `false` while a request is active.
    pub(crate) fn edit_url(&mut self, text: String) -> bool {
        if !self.is_idle() {
            return false;
        }
        let cancelled_settle = self.pending_settle.is_some();
        self.url_input = text;
        self.clear_user_data();
        if cancelled_settle {
            self.status = None;
        }
        true
    }

    /// Enters `Searching`; returns the raw URL to normalize.
    pub(crate) fn begin_search(&mut self) -> Option<String> {
        let url = self.url_input.trim();
        if url.is_empty() || !self.can_start_request() {
            return None;
        }
        let url = url.to_string();
        self.phase = RequestPhase::Searching;
        self.clear_user_data();
        self.set_status(Some(StatusMessage::info(SEARCHING_MESSAGE)));
        Some(url)
    }

    pub(crate) fn store_metadata(&mut self, metadata: VideoMetadata) {
        self.metadata = Some(metadata);
        self.set_status(None);
    }

    pub(crate) fn clear_metadata(&mut self) {
        self.metadata = None;
    }

    /// Enters `Downloading`; returns the raw URL to normalize.
    pub(crate) fn begin_download(&mut self, hints: DeviceHints) -> Option<String> {
        let url = self.url_input.trim();
        if url.is_empty() || !self.can_start_request() {
            return None;
        }
        let url = url.to_string();
        self.phase = RequestPhase::Downloading;
        self.hints = hints;
        self.drop_artifact();
        self.set_status(Some(StatusMessage::info(DOWNLOADING_MESSAGE)));
        Some(url)
    }

    /// Leaves the active phase if it is `expected`; returns `false` for stale replies.
    pub(crate) fn finish_phase(&mut self, expected: RequestPhase) -> bool {
        if self.phase != expected {
            return false;
        }
        self.phase = RequestPhase::Idle;
        true
    }

    /// Takes ownership of the downloaded bytes and arms the settle step.
    pub(crate) fn accept_download(
        &mut self,
        file_name: String,
        content_type: Option<String>,
        bytes: Bytes,
    ) -> ArtifactId {
        self.manual = None;
        let artifact_id = self.artifacts.create(file_name, content_type, bytes);
        self.pending_settle = Some(PendingSettle {
            artifact_id,
            hints: self.hints,
        });
        artifact_id
    }

    pub(crate) fn discard_download(&mut self) {
        self.drop_artifact();
    }

    /// Consumes the pending settle step if it belongs to the still-live `artifact_id`.
    pub(crate) fn take_pending_settle(&mut self, artifact_id: ArtifactId) -> Option<PendingSettle> {
        let pending = self.pending_settle?;
        if pending.artifact_id != artifact_id || self.artifacts.live_id() != Some(artifact_id) {
            return None;
        }
        self.pending_settle = None;
        Some(pending)
    }

    pub(crate) fn offer_manual_download(&mut self, artifact_id: ArtifactId, ios: bool) {
        self.manual = Some(ManualDownload { artifact_id, ios });
    }

    /// The retained artifact behind the manual link, if it is still live.
    pub(crate) fn manual_artifact(&self) -> Option<(ArtifactId, String, Bytes)> {
        let manual = self.manual.as_ref()?;
        let artifact = self.artifacts.live().filter(|a| a.id == manual.artifact_id)?;
        Some((artifact.id, artifact.file_name.clone(), artifact.bytes.clone()))
    }

    pub(crate) fn release_artifact(&mut self, artifact_id: ArtifactId) {
        if self.artifacts.release_if(artifact_id).is_some()
            && self.manual.as_ref().map(|m| m.artifact_id) == Some(artifact_id)
        {
            self.manual = None;
        }
    }

    pub(crate) fn record_save(&mut self, outcome: SaveOutcome) {
        self.last_saved = Some(outcome);
    }
}
