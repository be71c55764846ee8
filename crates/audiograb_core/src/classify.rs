use crate::{RequestFailure, StatusMessage};

pub const BLOCKED_MESSAGE: &str = "The source blocked the request. Please try again later.";
pub const UNAVAILABLE_MESSAGE: &str = "The video is unavailable or private.";
pub const UNREACHABLE_MESSAGE: &str = "Could not reach the conversion service.";

const BLOCKED_MARKERS: &[&str] = &["bot", "verif", "sign in", "bloque", "blocked"];
const UNAVAILABLE_MARKERS: &[&str] = &[
    "unavailable",
    "not available",
    "no está disponible",
    "private",
    "privado",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Authorization failure; the session gate already reacted.
    Suppress,
    /// Show this message to the user.
    Report(StatusMessage),
}

/// Maps a failed request to a user-facing outcome. First matching rule wins.
pub fn classify_failure(failure: &RequestFailure) -> Classification {
    if failure.is_unauthorized() {
        return Classification::Suppress;
    }

    let Some(message) = failure.backend_message() else {
        return Classification::Report(StatusMessage::error(UNREACHABLE_MESSAGE));
    };

    let lowered = message.to_lowercase();
    let text = if contains_any(&lowered, BLOCKED_MARKERS) {
        BLOCKED_MESSAGE.to_string()
    } else if contains_any(&lowered, UNAVAILABLE_MARKERS) {
        UNAVAILABLE_MESSAGE.to_string()
    } else {
        format!("Error: {}", message.trim())
    };
    Classification::Report(StatusMessage::error(text))
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusKind;

    fn backend(message: &str) -> RequestFailure {
        RequestFailure::Backend {
            status: 500,
            message: Some(message.to_string()),
        }
    }

    fn reported_text(failure: &RequestFailure) -> String {
        match classify_failure(failure) {
            Classification::Report(status) => {
                assert_eq!(status.kind, StatusKind::Error);
                status.text
            }
            Classification::Suppress => panic!("expected a report for {failure:?}"),
        }
    }

    #[test]
    fn unauthorized_is_suppressed_even_with_message() {
        let failure = RequestFailure::Unauthorized {
            message: Some("No autorizado".to_string()),
        };
        assert_eq!(classify_failure(&failure), Classification::Suppress);
    }

    #[test]
    fn bot_verification_language_means_blocked() {
        for message in [
            "YouTube requiere verificación. Intenta con otro video o más tarde.",
            "YouTube bloqueó la descarga. Intenta más tarde.",
            "Sign in to confirm you're not a bot",
        ] {
            assert_eq!(reported_text(&backend(message)), BLOCKED_MESSAGE);
        }
    }

    #[test]
    fn unavailable_language_means_unavailable() {
        for message in [
            "El video no está disponible o es privado.",
            "Video unavailable",
            "This is a PRIVATE video",
        ] {
            assert_eq!(reported_text(&backend(message)), UNAVAILABLE_MESSAGE);
        }
    }

    #[test]
    fn blocked_rule_runs_before_unavailable_rule() {
        let failure = backend("Private video. Sign in if you've been granted access");
        assert_eq!(reported_text(&failure), BLOCKED_MESSAGE);
    }

    #[test]
    fn other_backend_messages_are_surfaced_verbatim() {
        let failure = backend("Error de descarga: ffmpeg missing");
        assert_eq!(reported_text(&failure), "Error: Error de descarga: ffmpeg missing");
    }

    #[test]
    fn missing_message_is_a_reachability_problem() {
        let transport = RequestFailure::Transport {
            detail: "connection refused".to_string(),
        };
        assert_eq!(reported_text(&transport), UNREACHABLE_MESSAGE);

        let empty = RequestFailure::Backend {
            status: 502,
            message: None,
        };
        assert_eq!(reported_text(&empty), UNREACHABLE_MESSAGE);
    }
}
