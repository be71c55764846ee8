use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use audiograb_core::{
    update, AppState, AppViewModel, AudioPayload, DownloadTimings, Effect, LoginReceipt, Msg,
    RequestFailure, SaveOutcome, SessionProbe, VideoMetadata,
};
use audiograb_engine::{
    ApiError, AudioDownload, Backend, FailureKind, LocalSaver, SessionInfo, VideoInfo,
};
use grab_logging::{grab_debug, grab_info, grab_warn};
use tokio::sync::mpsc;

/// Runs `update` and executes its effects against the backend, the local
/// saver and the timer queue.
///
/// Request effects are awaited in place, so at most one backend call is in
/// flight. Timers run as spawned sleeps and post their message back through
/// a channel; [`Controller::settle`] feeds them into `update`.
pub struct Controller {
    state: AppState,
    backend: Arc<dyn Backend>,
    saver: Arc<dyn LocalSaver>,
    timer_tx: mpsc::UnboundedSender<Msg>,
    timer_rx: mpsc::UnboundedReceiver<Msg>,
    pending_timers: usize,
}

impl Controller {
    pub fn new(
        backend: Arc<dyn Backend>,
        saver: Arc<dyn LocalSaver>,
        timings: DownloadTimings,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::with_timings(timings),
            backend,
            saver,
            timer_tx,
            timer_rx,
            pending_timers: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    /// Number of timers that have not yet fired into `update`.
    pub fn pending_timers(&self) -> usize {
        self.pending_timers
    }

    /// Applies `msg` and every message its effects produce, in order.
    pub async fn dispatch(&mut self, msg: Msg) {
        let mut inbox = VecDeque::from([msg]);
        while let Some(msg) = inbox.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            for effect in effects {
                if let Some(reply) = self.run_effect(effect).await {
                    inbox.push_back(reply);
                }
            }
        }
    }

    /// Waits for every scheduled timer, including timers scheduled while
    /// handling earlier ones.
    pub async fn settle(&mut self) {
        while self.pending_timers > 0 {
            let Some(msg) = self.timer_rx.recv().await else {
                break;
            };
            self.pending_timers -= 1;
            self.dispatch(msg).await;
        }
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<Msg> {
        grab_debug!("effect={}", effect.label());
        match effect {
            Effect::CheckSession => Some(Msg::SessionChecked(
                self.backend
                    .session_status()
                    .await
                    .map(map_session)
                    .map_err(map_failure),
            )),
            Effect::SubmitLogin(credentials) => Some(Msg::LoginFinished(
                self.backend
                    .login(&credentials.username, &credentials.password)
                    .await
                    .map(|username| LoginReceipt { username })
                    .map_err(map_failure),
            )),
            Effect::NotifyLogout => Some(Msg::LogoutFinished(
                self.backend.logout().await.map_err(map_failure),
            )),
            Effect::FetchMetadata { url } => {
                grab_info!("fetching metadata for {}", url);
                Some(Msg::SearchFinished(
                    self.backend
                        .video_info(&url)
                        .await
                        .map(map_metadata)
                        .map_err(map_failure),
                ))
            }
            Effect::FetchAudio { url } => {
                grab_info!("fetching audio for {}", url);
                Some(Msg::DownloadFinished(
                    self.backend
                        .download_audio(&url)
                        .await
                        .map(map_payload)
                        .map_err(map_failure),
                ))
            }
            Effect::SaveArtifact {
                artifact_id,
                file_name,
                bytes,
            } => {
                let outcome = match self.saver.save(&file_name, &bytes) {
                    Ok(path) => SaveOutcome::Saved {
                        location: path.display().to_string(),
                    },
                    Err(err) => {
                        grab_warn!("save of {} failed: {}", file_name, err);
                        SaveOutcome::Failed {
                            reason: err.to_string(),
                        }
                    }
                };
                Some(Msg::ArtifactSaved {
                    artifact_id,
                    outcome,
                })
            }
            Effect::ScheduleSettle { artifact_id, delay } => {
                self.schedule(delay, Msg::SaveSettled { artifact_id });
                None
            }
            Effect::ScheduleRelease { artifact_id, delay } => {
                self.schedule(delay, Msg::ReleaseDue { artifact_id });
                None
            }
        }
    }

    fn schedule(&mut self, delay: Duration, msg: Msg) {
        let tx = self.timer_tx.clone();
        self.pending_timers += 1;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(msg);
        });
    }
}

fn map_session(info: SessionInfo) -> SessionProbe {
    SessionProbe {
        logged_in: info.logged_in,
        username: info.username,
    }
}

fn map_metadata(info: VideoInfo) -> VideoMetadata {
    VideoMetadata {
        title: info.title,
        thumbnail: info.thumbnail,
        duration: info.duration_secs,
    }
}

fn map_payload(download: AudioDownload) -> AudioPayload {
    AudioPayload {
        bytes: download.bytes,
        content_disposition: download.content_disposition,
        content_type: download.content_type,
    }
}

fn map_failure(err: ApiError) -> RequestFailure {
    match err.kind {
        FailureKind::Unauthorized => RequestFailure::Unauthorized {
            message: err.server_message,
        },
        FailureKind::HttpStatus(status) => RequestFailure::Backend {
            status,
            message: err.server_message,
        },
        _ => RequestFailure::Transport {
            detail: err.to_string(),
        },
    }
}
