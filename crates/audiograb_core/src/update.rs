use grab_logging::{grab_debug, grab_info, grab_warn};

use crate::classify::{classify_failure, Classification};
use crate::content_disposition::suggested_file_name;
use crate::state::{
    DOWNLOAD_COMPLETE_MESSAGE, MANUAL_FALLBACK_IOS_MESSAGE, MANUAL_FALLBACK_MESSAGE,
    SESSION_EXPIRED_MESSAGE,
};
use crate::{
    normalize_video_url, AppState, Effect, Msg, RequestFailure, RequestPhase, SaveOutcome,
    StatusMessage,
};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    grab_debug!("update msg={}", msg.label());
    let effects = match msg {
        Msg::Started => {
            if state.session.begin_probe() {
                vec![Effect::CheckSession]
            } else {
                Vec::new()
            }
        }
        Msg::SessionChecked(result) => {
            run_response_hook(&mut state, &result);
            if state.session.resolve_probe(&result) {
                grab_info!("session resolved: {:?}", state.session.phase());
            }
            Vec::new()
        }
        Msg::LoginSubmitted(credentials) => {
            if state.session.begin_login() {
                grab_info!("login submitted for {}", credentials.username);
                vec![Effect::SubmitLogin(credentials)]
            } else {
                Vec::new()
            }
        }
        Msg::LoginFinished(result) => {
            run_response_hook(&mut state, &result);
            match result {
                Ok(receipt) => {
                    state.session.finish_login(receipt.username);
                    state.set_status(None);
                }
                Err(failure) => {
                    state.session.fail_login();
                    grab_warn!("login failed: {}", failure);
                    if let Classification::Report(status) =
                        classify_failure(&as_credential_rejection(failure))
                    {
                        state.set_status(Some(status));
                    }
                }
            }
            Vec::new()
        }
        Msg::LogoutClicked => {
            if state.session.checking() {
                return (state, Vec::new());
            }
            state.session.logout();
            state.clear_user_data();
            state.set_status(None);
            vec![Effect::NotifyLogout]
        }
        Msg::LogoutFinished(result) => {
            run_response_hook(&mut state, &result);
            if let Err(failure) = result {
                grab_debug!("logout notification failed (ignored): {}", failure);
            }
            Vec::new()
        }
        Msg::UrlEdited(text) => {
            state.edit_url(text);
            Vec::new()
        }
        Msg::SearchSubmitted => match state.begin_search() {
            Some(raw) => vec![Effect::FetchMetadata {
                url: normalize_video_url(&raw),
            }],
            None => Vec::new(),
        },
        Msg::SearchFinished(result) => {
            run_response_hook(&mut state, &result);
            if !state.finish_phase(RequestPhase::Searching) {
                return (state, Vec::new());
            }
            if !state.session.authenticated() {
                return (state, Vec::new());
            }
            match result {
                Ok(metadata) => {
                    grab_info!("metadata received: {}", metadata.title);
                    state.store_metadata(metadata);
                }
                Err(failure) => {
                    if let Classification::Report(status) = classify_failure(&failure) {
                        grab_warn!("search failed: {} -> {}", failure, status);
                        state.set_status(Some(status));
                        state.clear_metadata();
                    }
                }
            }
            Vec::new()
        }
        Msg::DownloadRequested(hints) => match state.begin_download(hints) {
            Some(raw) => vec![Effect::FetchAudio {
                url: normalize_video_url(&raw),
            }],
            None => Vec::new(),
        },
        Msg::DownloadFinished(result) => {
            run_response_hook(&mut state, &result);
            if !state.finish_phase(RequestPhase::Downloading) {
                return (state, Vec::new());
            }
            if !state.session.authenticated() {
                return (state, Vec::new());
            }
            match result {
                Ok(payload) => {
                    let file_name = suggested_file_name(payload.content_disposition.as_deref());
                    grab_info!(
                        "download received: {} ({} bytes)",
                        file_name,
                        payload.bytes.len()
                    );
                    let bytes = payload.bytes.clone();
                    let artifact_id =
                        state.accept_download(file_name.clone(), payload.content_type, payload.bytes);
                    vec![
                        Effect::SaveArtifact {
                            artifact_id,
                            file_name,
                            bytes,
                        },
                        Effect::ScheduleSettle {
                            artifact_id,
                            delay: state.timings().settle_delay,
                        },
                    ]
                }
                Err(failure) => {
                    if let Classification::Report(status) = classify_failure(&failure) {
                        grab_warn!("download failed: {} -> {}", failure, status);
                        state.set_status(Some(status));
                        state.discard_download();
                    }
                    Vec::new()
                }
            }
        }
        Msg::ArtifactSaved {
            artifact_id,
            outcome,
        } => {
            match &outcome {
                SaveOutcome::Saved { location } => {
                    grab_info!("artifact {} saved to {}", artifact_id, location);
                }
                SaveOutcome::Failed { reason } => {
                    grab_warn!("artifact {} could not be saved: {}", artifact_id, reason);
                }
            }
            state.record_save(outcome);
            Vec::new()
        }
        Msg::SaveSettled { artifact_id } => match state.take_pending_settle(artifact_id) {
            Some(pending) if pending.hints.mobile => {
                state.offer_manual_download(artifact_id, pending.hints.ios);
                let text = if pending.hints.ios {
                    MANUAL_FALLBACK_IOS_MESSAGE
                } else {
                    MANUAL_FALLBACK_MESSAGE
                };
                state.set_status(Some(StatusMessage::info(text)));
                Vec::new()
            }
            Some(_) => {
                state.set_status(Some(StatusMessage::success(DOWNLOAD_COMPLETE_MESSAGE)));
                vec![Effect::ScheduleRelease {
                    artifact_id,
                    delay: state.timings().release_grace,
                }]
            }
            None => Vec::new(),
        },
        Msg::ReleaseDue { artifact_id } => {
            state.release_artifact(artifact_id);
            Vec::new()
        }
        Msg::ManualSaveRequested => match state.manual_artifact() {
            Some((artifact_id, file_name, bytes)) => vec![Effect::SaveArtifact {
                artifact_id,
                file_name,
                bytes,
            }],
            None => Vec::new(),
        },
    };

    (state, effects)
}

/// Observes every backend reply before its own handler runs. An authorization
/// failure that ends the session clears all per-user data exactly once.
fn run_response_hook<T>(state: &mut AppState, result: &Result<T, RequestFailure>) {
    if state.session.observe_response(result) {
        state.clear_user_data();
        state.set_status(Some(StatusMessage::error(SESSION_EXPIRED_MESSAGE)));
    }
}

/// A 401 from the login endpoint rejects the credentials; it is not a lost session.
fn as_credential_rejection(failure: RequestFailure) -> RequestFailure {
    match failure {
        RequestFailure::Unauthorized { message } => RequestFailure::Backend {
            status: 401,
            message: message
                .filter(|m| !m.trim().is_empty())
                .or_else(|| Some(INVALID_CREDENTIALS_MESSAGE.to_string())),
        },
        other => other,
    }
}
