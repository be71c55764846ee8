use std::sync::Once;
use std::time::Duration;

use audiograb_core::{
    update, AppState, AudioPayload, DeviceHints, DownloadTimings, Effect, Msg, RequestFailure,
    RequestPhase, SaveOutcome, SessionProbe, StatusKind, VideoMetadata, BLOCKED_MESSAGE,
    DOWNLOADING_MESSAGE, DOWNLOAD_COMPLETE_MESSAGE, FALLBACK_FILE_NAME,
    MANUAL_FALLBACK_IOS_MESSAGE, MANUAL_FALLBACK_MESSAGE,
};
use bytes::Bytes;
use pretty_assertions::assert_eq;

const DESKTOP: DeviceHints = DeviceHints {
    mobile: false,
    ios: false,
};
const ANDROID: DeviceHints = DeviceHints {
    mobile: true,
    ios: false,
};
const IPHONE: DeviceHints = DeviceHints {
    mobile: true,
    ios: true,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(grab_logging::initialize_for_tests);
}

fn timings() -> DownloadTimings {
    DownloadTimings {
        settle_delay: Duration::from_millis(1500),
        release_grace: Duration::from_millis(5000),
    }
}

/// Signed in, with metadata for `https://youtu.be/X` on screen.
fn ready() -> AppState {
    let (state, _) = update(AppState::with_timings(timings()), Msg::Started);
    let (state, _) = update(
        state,
        Msg::SessionChecked(Ok(SessionProbe {
            logged_in: true,
            username: None,
        })),
    );
    let (state, _) = update(state, Msg::UrlEdited("https://youtu.be/X".to_string()));
    let (state, _) = update(state, Msg::SearchSubmitted);
    let (state, _) = update(
        state,
        Msg::SearchFinished(Ok(VideoMetadata {
            title: "Song".to_string(),
            thumbnail: "https://i.ytimg.com/vi/X/hq.jpg".to_string(),
            duration: None,
        })),
    );
    state
}

fn payload(disposition: Option<&str>) -> AudioPayload {
    AudioPayload {
        bytes: Bytes::from_static(b"ID3\x04audio"),
        content_disposition: disposition.map(ToOwned::to_owned),
        content_type: Some("audio/mpeg".to_string()),
    }
}

/// Runs a download to the point where the bytes arrived; returns the artifact id.
fn downloaded(hints: DeviceHints, disposition: Option<&str>) -> (AppState, u64, Vec<Effect>) {
    let (state, effects) = update(ready(), Msg::DownloadRequested(hints));
    assert_eq!(
        effects,
        vec![Effect::FetchAudio {
            url: "https://www.youtube.com/watch?v=X".to_string(),
        }]
    );
    assert_eq!(state.phase(), RequestPhase::Downloading);
    assert_eq!(
        state.status().map(|s| s.text.as_str()),
        Some(DOWNLOADING_MESSAGE)
    );

    let (state, effects) = update(state, Msg::DownloadFinished(Ok(payload(disposition))));
    let artifact_id = state.artifacts().live_id().expect("artifact created");
    (state, artifact_id, effects)
}

#[test]
fn download_saves_under_extracted_name_and_schedules_settle() {
    init_logging();
    let (state, artifact_id, effects) = downloaded(
        DESKTOP,
        Some("attachment; filename*=UTF-8''cancio%CC%81n.mp3"),
    );

    assert_eq!(
        effects,
        vec![
            Effect::SaveArtifact {
                artifact_id,
                file_name: "cancio\u{301}n.mp3".to_string(),
                bytes: Bytes::from_static(b"ID3\x04audio"),
            },
            Effect::ScheduleSettle {
                artifact_id,
                delay: Duration::from_millis(1500),
            },
        ]
    );
    assert_eq!(state.phase(), RequestPhase::Idle);
    assert_eq!(state.view().live_artifacts, 1);
}

#[test]
fn missing_disposition_uses_fallback_name() {
    init_logging();
    let (_, _, effects) = downloaded(DESKTOP, None);
    match &effects[0] {
        Effect::SaveArtifact { file_name, .. } => assert_eq!(file_name, FALLBACK_FILE_NAME),
        other => panic!("unexpected effect {other:?}"),
    }
}

#[test]
fn desktop_reports_completion_then_releases_after_grace() {
    init_logging();
    let (state, artifact_id, _) = downloaded(DESKTOP, Some("attachment; filename=\"plain.mp3\""));

    let (state, _) = update(
        state,
        Msg::ArtifactSaved {
            artifact_id,
            outcome: SaveOutcome::Saved {
                location: "/tmp/plain.mp3".to_string(),
            },
        },
    );
    let (state, effects) = update(state, Msg::SaveSettled { artifact_id });
    assert_eq!(
        effects,
        vec![Effect::ScheduleRelease {
            artifact_id,
            delay: Duration::from_millis(5000),
        }]
    );
    let status = state.status().cloned().expect("status");
    assert_eq!(status.kind, StatusKind::Success);
    assert_eq!(status.text, DOWNLOAD_COMPLETE_MESSAGE);
    assert_eq!(state.view().manual_download, None);
    assert_eq!(state.view().live_artifacts, 1);

    let (state, _) = update(state, Msg::ReleaseDue { artifact_id });
    assert_eq!(state.view().live_artifacts, 0);
    assert_eq!(state.artifacts().released_count(), 1);

    // A second release is a no-op.
    let (state, _) = update(state, Msg::ReleaseDue { artifact_id });
    assert_eq!(state.artifacts().released_count(), 1);
}

#[test]
fn mobile_keeps_artifact_as_manual_link() {
    init_logging();
    let (state, artifact_id, _) = downloaded(ANDROID, Some("attachment; filename=\"plain.mp3\""));
    let (state, effects) = update(state, Msg::SaveSettled { artifact_id });

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.status.map(|s| s.text), Some(MANUAL_FALLBACK_MESSAGE.to_string()));
    let manual = view.manual_download.expect("manual link");
    assert_eq!(manual.file_name, "plain.mp3");
    assert!(!manual.ios);
    assert_eq!(view.live_artifacts, 1);

    let (_, effects) = update(state, Msg::ManualSaveRequested);
    assert_eq!(
        effects,
        vec![Effect::SaveArtifact {
            artifact_id,
            file_name: "plain.mp3".to_string(),
            bytes: Bytes::from_static(b"ID3\x04audio"),
        }]
    );
}

#[test]
fn ios_gets_share_sheet_instructions() {
    init_logging();
    let (state, artifact_id, _) = downloaded(IPHONE, None);
    let (state, _) = update(state, Msg::SaveSettled { artifact_id });

    let view = state.view();
    assert_eq!(
        view.status.map(|s| s.text),
        Some(MANUAL_FALLBACK_IOS_MESSAGE.to_string())
    );
    assert!(view.manual_download.expect("manual link").ios);
}

#[test]
fn editing_the_url_releases_manual_link() {
    init_logging();
    let (state, artifact_id, _) = downloaded(ANDROID, None);
    let (state, _) = update(state, Msg::SaveSettled { artifact_id });
    assert_eq!(state.view().live_artifacts, 1);

    let (state, _) = update(state, Msg::UrlEdited("https://youtu.be/Y".to_string()));
    let view = state.view();
    assert_eq!(view.live_artifacts, 0);
    assert_eq!(view.manual_download, None);
    assert_eq!(view.metadata, None);

    let (_, effects) = update(state, Msg::ManualSaveRequested);
    assert!(effects.is_empty());
}

#[test]
fn settle_for_released_artifact_is_ignored() {
    init_logging();
    let (state, artifact_id, _) = downloaded(DESKTOP, None);
    let (state, _) = update(state, Msg::UrlEdited("https://youtu.be/Y".to_string()));
    assert_eq!(state.status(), None);

    let (state, effects) = update(state, Msg::SaveSettled { artifact_id });
    assert!(effects.is_empty());
    assert_eq!(state.status(), None);
}

#[test]
fn second_download_supersedes_first_artifact() {
    init_logging();
    let (state, first, _) = downloaded(DESKTOP, None);
    let (state, _) = update(state, Msg::DownloadRequested(DESKTOP));
    assert_eq!(state.view().live_artifacts, 0, "released before the new request");
    let (state, _) = update(state, Msg::DownloadFinished(Ok(payload(None))));
    let second = state.artifacts().live_id().expect("new artifact");
    assert_ne!(first, second);
    assert_eq!(state.artifacts().released_count(), 1);

    // The first download's timers no longer apply.
    let (state, effects) = update(state, Msg::SaveSettled { artifact_id: first });
    assert!(effects.is_empty());
    let (state, _) = update(state, Msg::ReleaseDue { artifact_id: first });
    assert_eq!(state.artifacts().live_id(), Some(second));
}

#[test]
fn blocked_download_reports_retry_later_without_artifact() {
    init_logging();
    let (state, _) = update(ready(), Msg::DownloadRequested(DESKTOP));
    let (state, effects) = update(
        state,
        Msg::DownloadFinished(Err(RequestFailure::Backend {
            status: 503,
            message: Some("YouTube bloqueó la descarga. Intenta más tarde.".to_string()),
        })),
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.phase, RequestPhase::Idle);
    assert_eq!(view.status.map(|s| s.text), Some(BLOCKED_MESSAGE.to_string()));
    assert_eq!(view.live_artifacts, 0);
    assert_eq!(view.manual_download, None);
    assert!(view.metadata.is_some(), "metadata survives a failed download");
}

#[test]
fn failed_save_is_recorded_without_changing_the_branch() {
    init_logging();
    let (state, artifact_id, _) = downloaded(DESKTOP, None);
    let (state, _) = update(
        state,
        Msg::ArtifactSaved {
            artifact_id,
            outcome: SaveOutcome::Failed {
                reason: "disk full".to_string(),
            },
        },
    );
    assert!(matches!(
        state.view().last_saved,
        Some(SaveOutcome::Failed { .. })
    ));

    let (state, effects) = update(state, Msg::SaveSettled { artifact_id });
    assert_eq!(effects.len(), 1);
    assert_eq!(
        state.status().map(|s| s.text.as_str()),
        Some(DOWNLOAD_COMPLETE_MESSAGE)
    );
}
