use grab_logging::{grab_info, grab_warn};

use crate::{RequestFailure, SessionProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Checking,
    Authenticated,
    Unauthenticated,
}

/// Authentication state shared by every request path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionGate {
    phase: SessionPhase,
    username: Option<String>,
    probe_issued: bool,
    login_in_flight: bool,
    demotions: u64,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn checking(&self) -> bool {
        self.phase == SessionPhase::Checking
    }

    pub fn authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn login_in_flight(&self) -> bool {
        self.login_in_flight
    }

    /// Number of forced demotions caused by authorization failures.
    pub fn demotions(&self) -> u64 {
        self.demotions
    }

    /// Marks the startup probe as issued; returns `false` if it already was.
    pub(crate) fn begin_probe(&mut self) -> bool {
        if self.probe_issued || !self.checking() {
            return false;
        }
        self.probe_issued = true;
        true
    }

    /// Resolves `Checking` exactly once. Returns `false` for late or repeated probes.
    pub(crate) fn resolve_probe(&mut self, result: &Result<SessionProbe, RequestFailure>) -> bool {
        if !self.checking() {
            return false;
        }
        match result {
            Ok(probe) if probe.logged_in => {
                self.phase = SessionPhase::Authenticated;
                self.username = probe.username.clone();
                grab_info!("session probe: authenticated as {:?}", self.username);
            }
            Ok(_) => {
                self.phase = SessionPhase::Unauthenticated;
                grab_info!("session probe: not signed in");
            }
            Err(failure) => {
                self.phase = SessionPhase::Unauthenticated;
                grab_warn!("session probe failed: {}", failure);
            }
        }
        true
    }

    /// Login is only possible from a resolved, signed-out state with no attempt pending.
    pub(crate) fn begin_login(&mut self) -> bool {
        if self.phase != SessionPhase::Unauthenticated || self.login_in_flight {
            return false;
        }
        self.login_in_flight = true;
        true
    }

    pub(crate) fn finish_login(&mut self, username: Option<String>) {
        self.login_in_flight = false;
        if self.phase == SessionPhase::Unauthenticated {
            self.phase = SessionPhase::Authenticated;
            self.username = username;
            grab_info!("signed in as {:?}", self.username);
        }
    }

    pub(crate) fn fail_login(&mut self) {
        self.login_in_flight = false;
    }

    pub(crate) fn logout(&mut self) {
        if self.phase != SessionPhase::Unauthenticated {
            grab_info!("signed out");
        }
        self.phase = SessionPhase::Unauthenticated;
        self.username = None;
    }

    /// Response hook run for every backend reply before its own handler.
    ///
    /// Returns `true` only for the authorization failure that ends an
    /// authenticated session; repeated failures while signed out return `false`.
    pub(crate) fn observe_response<T>(&mut self, result: &Result<T, RequestFailure>) -> bool {
        let Err(failure) = result else {
            return false;
        };
        if !failure.is_unauthorized() || self.phase != SessionPhase::Authenticated {
            return false;
        }
        self.phase = SessionPhase::Unauthenticated;
        self.username = None;
        self.demotions += 1;
        grab_warn!("authorization failure: session expired");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unauthorized<T>() -> Result<T, RequestFailure> {
        Err(RequestFailure::Unauthorized { message: None })
    }

    fn signed_in() -> SessionGate {
        let mut gate = SessionGate::new();
        assert!(gate.begin_probe());
        gate.resolve_probe(&Ok(SessionProbe {
            logged_in: true,
            username: Some("ana".to_string()),
        }));
        gate
    }

    #[test]
    fn probe_resolves_checking_exactly_once() {
        let mut gate = SessionGate::new();
        assert!(gate.checking());
        assert!(gate.begin_probe());
        assert!(!gate.begin_probe());

        assert!(gate.resolve_probe(&Ok(SessionProbe::default())));
        assert_eq!(gate.phase(), SessionPhase::Unauthenticated);

        let late = Ok(SessionProbe {
            logged_in: true,
            username: None,
        });
        assert!(!gate.resolve_probe(&late));
        assert!(!gate.authenticated());
    }

    #[test]
    fn failed_probe_means_signed_out() {
        let mut gate = SessionGate::new();
        gate.begin_probe();
        gate.resolve_probe(&Err(RequestFailure::Transport {
            detail: "refused".to_string(),
        }));
        assert!(!gate.checking());
        assert!(!gate.authenticated());
    }

    #[test]
    fn demotion_happens_once_per_session_loss() {
        let mut gate = signed_in();
        assert_eq!(gate.username(), Some("ana"));

        assert!(gate.observe_response::<()>(&unauthorized()));
        assert!(!gate.observe_response::<()>(&unauthorized()));
        assert_eq!(gate.demotions(), 1);
        assert_eq!(gate.phase(), SessionPhase::Unauthenticated);
        assert_eq!(gate.username(), None);
    }

    #[test]
    fn non_authorization_failures_do_not_demote() {
        let mut gate = signed_in();
        let failure: Result<(), _> = Err(RequestFailure::Backend {
            status: 500,
            message: None,
        });
        assert!(!gate.observe_response(&failure));
        assert!(gate.authenticated());
    }

    #[test]
    fn login_requires_resolved_signed_out_state() {
        let mut gate = SessionGate::new();
        assert!(!gate.begin_login(), "no login while checking");

        gate.begin_probe();
        gate.resolve_probe(&Ok(SessionProbe::default()));
        assert!(gate.begin_login());
        assert!(!gate.begin_login(), "one login at a time");

        gate.fail_login();
        assert!(gate.begin_login());
        gate.finish_login(Some("ana".to_string()));
        assert!(gate.authenticated());
        assert!(!gate.begin_login());
    }
}
