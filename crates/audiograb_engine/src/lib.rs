//! Audiograb engine: backend HTTP client and local persistence.
mod backend;
mod filename;
mod persist;
mod types;

pub use backend::{Backend, ClientSettings, ReqwestBackend, DEFAULT_BASE_URL};
pub use filename::safe_file_name;
pub use persist::{ensure_output_dir, AtomicFileWriter, DirectorySaver, LocalSaver, PersistError};
pub use types::{ApiError, AudioDownload, FailureKind, SessionInfo, VideoInfo};
