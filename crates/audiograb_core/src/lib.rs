//! Audiograb core: pure download-controller state machine and view-model helpers.
mod artifact;
mod classify;
mod content_disposition;
mod effect;
mod msg;
mod normalize;
mod session;
mod state;
mod types;
mod update;
mod view_model;

pub use artifact::{ArtifactLifecycle, DownloadArtifact};
pub use classify::{
    classify_failure, Classification, BLOCKED_MESSAGE, UNAVAILABLE_MESSAGE, UNREACHABLE_MESSAGE,
};
pub use content_disposition::{suggested_file_name, FALLBACK_FILE_NAME};
pub use effect::Effect;
pub use msg::Msg;
pub use normalize::{normalize_video_url, CANONICAL_HOST};
pub use session::{SessionGate, SessionPhase};
pub use state::{
    AppState, DOWNLOADING_MESSAGE, DOWNLOAD_COMPLETE_MESSAGE, MANUAL_FALLBACK_IOS_MESSAGE,
    MANUAL_FALLBACK_MESSAGE, SEARCHING_MESSAGE, SESSION_EXPIRED_MESSAGE,
};
pub use types::{
    ArtifactId, AudioPayload, Credentials, DeviceHints, DownloadTimings, LoginReceipt,
    RequestFailure, RequestPhase, SaveOutcome, SessionProbe, StatusKind, StatusMessage,
    VideoMetadata,
};
pub use update::{update, INVALID_CREDENTIALS_MESSAGE};
pub use view_model::{format_duration, AppViewModel, ManualDownloadView, MetadataView, SessionView};
