use crate::{ArtifactId, RequestPhase, SaveOutcome, StatusMessage};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    pub checking: bool,
    pub authenticated: bool,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataView {
    pub title: String,
    pub thumbnail: String,
    pub duration_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualDownloadView {
    pub artifact_id: ArtifactId,
    pub file_name: String,
    pub ios: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionView,
    pub url_input: String,
    pub phase: RequestPhase,
    pub status: Option<StatusMessage>,
    pub metadata: Option<MetadataView>,
    pub manual_download: Option<ManualDownloadView>,
    pub live_artifacts: usize,
    pub released_artifacts: u64,
    pub last_saved: Option<SaveOutcome>,
    pub input_enabled: bool,
    pub search_enabled: bool,
    pub download_enabled: bool,
}

/// `m:ss` below an hour, `h:mm:ss` above.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::format_duration;

    #[test]
    fn durations_render_like_a_player() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(213), "3:33");
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(3725), "1:02:05");
    }
}
