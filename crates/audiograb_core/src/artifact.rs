use bytes::Bytes;
use grab_logging::grab_debug;

use crate::ArtifactId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub id: ArtifactId,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Sole owner of the downloaded bytes. Never holds more than one live artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLifecycle {
    live: Option<DownloadArtifact>,
    next_id: ArtifactId,
    released: u64,
}

impl Default for ArtifactLifecycle {
    fn default() -> Self {
        Self {
            live: None,
            next_id: 1,
            released: 0,
        }
    }
}

impl ArtifactLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `bytes`, releasing any still-live artifact first.
    pub fn create(
        &mut self,
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: Bytes,
    ) -> ArtifactId {
        self.release();
        let id = self.next_id;
        self.next_id += 1;
        let artifact = DownloadArtifact {
            id,
            file_name: file_name.into(),
            content_type,
            bytes,
        };
        grab_debug!(
            "artifact {} created file_name={} bytes={}",
            id,
            artifact.file_name,
            artifact.bytes.len()
        );
        self.live = Some(artifact);
        id
    }

    /// Drops the live artifact. A no-op returning `None` when nothing is live.
    pub fn release(&mut self) -> Option<ArtifactId> {
        let artifact = self.live.take()?;
        self.released += 1;
        grab_debug!("artifact {} released", artifact.id);
        Some(artifact.id)
    }

    /// Releases only when `id` is still the live artifact.
    pub fn release_if(&mut self, id: ArtifactId) -> Option<ArtifactId> {
        if self.live_id() == Some(id) {
            self.release()
        } else {
            None
        }
    }

    pub fn live(&self) -> Option<&DownloadArtifact> {
        self.live.as_ref()
    }

    pub fn live_id(&self) -> Option<ArtifactId> {
        self.live.as_ref().map(|artifact| artifact.id)
    }

    pub fn live_count(&self) -> usize {
        usize::from(self.live.is_some())
    }

    pub fn released_count(&self) -> u64 {
        self.released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Bytes {
        Bytes::from_static(b"ID3")
    }

    #[test]
    fn release_twice_is_a_noop_the_second_time() {
        let mut lifecycle = ArtifactLifecycle::new();
        let id = lifecycle.create("a.mp3", None, payload());

        assert_eq!(lifecycle.release(), Some(id));
        assert_eq!(lifecycle.release(), None);
        assert_eq!(lifecycle.released_count(), 1);
        assert_eq!(lifecycle.live_count(), 0);
    }

    #[test]
    fn create_releases_previous_artifact() {
        let mut lifecycle = ArtifactLifecycle::new();
        let first = lifecycle.create("a.mp3", None, payload());
        let second = lifecycle.create("b.mp3", Some("audio/mpeg".into()), payload());

        assert_ne!(first, second);
        assert_eq!(lifecycle.live_count(), 1);
        assert_eq!(lifecycle.live_id(), Some(second));
        assert_eq!(lifecycle.released_count(), 1);
    }

    #[test]
    fn release_if_ignores_superseded_ids() {
        let mut lifecycle = ArtifactLifecycle::new();
        let first = lifecycle.create("a.mp3", None, payload());
        let second = lifecycle.create("b.mp3", None, payload());

        assert_eq!(lifecycle.release_if(first), None);
        assert_eq!(lifecycle.live_id(), Some(second));
        assert_eq!(lifecycle.release_if(second), Some(second));
        assert_eq!(lifecycle.release_if(second), None);
        assert_eq!(lifecycle.released_count(), 2);
    }

    #[test]
    fn release_on_empty_lifecycle_is_a_noop() {
        let mut lifecycle = ArtifactLifecycle::new();
        assert_eq!(lifecycle.release(), None);
        assert_eq!(lifecycle.released_count(), 0);
    }
}
