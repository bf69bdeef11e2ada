//! Session-scoped access control for private notes.
//!
//! # Responsibility
//! - Hold the `unlocked` and `changes allowed` flags for one app session.
//! - Drive the `Locked -> Authenticating -> Unlocked` state machine.
//! - Reset permissions when the app leaves the foreground.
//!
//! # Invariants
//! - Both flags start `false` and are never persisted.
//! - `unlocked` turns `true` only after a successful `ViewNotes` request.
//! - `changes allowed` turns `true` only after a successful
//!   `ChangeLockStatus` request and is consumed by one lock toggle.
//! - A failed request never revokes a flag that was already granted.
//! - At most one request is pending; a second one is rejected with `Busy`.

use crate::access::authenticator::{AuthError, AuthPolicy, AuthReason, Authenticator};
use log::{info, warn};

/// Policy requested for every gated operation.
pub const SESSION_AUTH_POLICY: AuthPolicy = AuthPolicy::DeviceOwnerAuthentication;

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Locked,
    Authenticating(AuthReason),
    Unlocked,
}

/// Application lifecycle phase reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    Active,
    Inactive,
    Background,
}

impl AppPhase {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" | "resumed" => Some(Self::Active),
            "inactive" | "paused" => Some(Self::Inactive),
            "background" | "hidden" | "detached" => Some(Self::Background),
            _ => None,
        }
    }
}

/// Handle for one pending authentication request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTicket {
    id: u64,
    reason: AuthReason,
}

impl AuthTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn reason(&self) -> AuthReason {
        self.reason
    }
}

/// Permission state for the current app session.
#[derive(Debug, Default)]
pub struct AccessSession {
    unlocked: bool,
    changes_allowed: bool,
    pending: Option<AuthTicket>,
    issued: u64,
    last_error: Option<AuthError>,
}

impl AccessSession {
    /// Creates a locked session with no permissions.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn are_changes_allowed(&self) -> bool {
        self.changes_allowed
    }

    pub fn state(&self) -> SessionState {
        match (self.pending, self.unlocked) {
            (Some(ticket), _) => SessionState::Authenticating(ticket.reason),
            (None, true) => SessionState::Unlocked,
            (None, false) => SessionState::Locked,
        }
    }

    /// Last classified failure, kept until the next success or `clear_error`.
    pub fn authentication_error(&self) -> Option<&AuthError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Ticket of the pending request, if any.
    pub fn pending_ticket(&self) -> Option<AuthTicket> {
        self.pending
    }

    /// Runs one authentication round trip through `authenticator`.
    ///
    /// `on_success` runs exactly once, after the flag for `reason` is set,
    /// and never on failure.
    ///
    /// # Errors
    /// - `Busy` when another request is pending (state left untouched).
    /// - `Unavailable` when the device cannot evaluate the policy; the user
    ///   is not prompted.
    /// - Any failure reported by the authenticator.
    pub fn authenticate<A, F>(
        &mut self,
        authenticator: &A,
        reason: AuthReason,
        on_success: F,
    ) -> Result<(), AuthError>
    where
        A: Authenticator + ?Sized,
        F: FnOnce(),
    {
        let ticket = self.begin(reason)?;
        let outcome = if authenticator.can_evaluate(SESSION_AUTH_POLICY) {
            authenticator.evaluate(SESSION_AUTH_POLICY, reason)
        } else {
            Err(AuthError::Unavailable)
        };
        self.complete(ticket, outcome)?;
        on_success();
        Ok(())
    }

    /// Starts a request whose prompt is run by the caller.
    ///
    /// # Errors
    /// - `Busy` when another request is pending.
    pub fn begin(&mut self, reason: AuthReason) -> Result<AuthTicket, AuthError> {
        if let Some(pending) = self.pending {
            warn!(
                "event=auth_begin module=access status=rejected reason={} pending_reason={}",
                reason.as_str(),
                pending.reason.as_str()
            );
            return Err(AuthError::Busy);
        }

        self.issued += 1;
        let ticket = AuthTicket {
            id: self.issued,
            reason,
        };
        self.pending = Some(ticket);
        info!(
            "event=auth_begin module=access status=ok reason={} ticket={}",
            reason.as_str(),
            ticket.id
        );
        Ok(ticket)
    }

    /// Applies the outcome of the request identified by `ticket`.
    ///
    /// # Errors
    /// - `NoPendingRequest` when `ticket` is not the pending request.
    /// - The failure passed in `outcome`, after recording it.
    pub fn complete(
        &mut self,
        ticket: AuthTicket,
        outcome: Result<(), AuthError>,
    ) -> Result<(), AuthError> {
        if self.pending != Some(ticket) {
            warn!(
                "event=auth_complete module=access status=rejected ticket={}",
                ticket.id
            );
            return Err(AuthError::NoPendingRequest);
        }
        self.pending = None;

        match outcome {
            Ok(()) => {
                match ticket.reason {
                    AuthReason::ViewNotes => self.unlocked = true,
                    AuthReason::ChangeLockStatus => self.changes_allowed = true,
                }
                self.last_error = None;
                info!(
                    "event=auth_complete module=access status=ok reason={}",
                    ticket.reason.as_str()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=auth_complete module=access status=error reason={} error_code={}",
                    ticket.reason.as_str(),
                    err.code()
                );
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Hides private notes again.
    pub fn lock(&mut self) {
        if self.unlocked {
            info!("event=session_lock module=access status=ok");
        }
        self.unlocked = false;
    }

    /// Drops a granted but unused lock-toggle permission.
    pub fn revoke_changes(&mut self) {
        self.changes_allowed = false;
    }

    /// Consumes the lock-toggle permission; `true` when one was granted.
    pub fn take_change_permission(&mut self) -> bool {
        std::mem::take(&mut self.changes_allowed)
    }

    /// Reacts to a lifecycle change reported by the host.
    ///
    /// Leaving the foreground revokes both permissions. A pending request is
    /// kept: the system prompt itself deactivates the app.
    pub fn handle_phase(&mut self, phase: AppPhase) {
        match phase {
            AppPhase::Active => {}
            AppPhase::Inactive | AppPhase::Background => {
                self.lock();
                self.revoke_changes();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessSession, AppPhase, SessionState};
    use crate::access::authenticator::{AuthError, AuthReason};

    #[test]
    fn new_session_is_locked_without_permissions() {
        let session = AccessSession::new();
        assert_eq!(session.state(), SessionState::Locked);
        assert!(!session.is_unlocked());
        assert!(!session.are_changes_allowed());
        assert!(session.authentication_error().is_none());
    }

    #[test]
    fn stale_ticket_is_rejected() {
        let mut session = AccessSession::new();
        let first = session.begin(AuthReason::ViewNotes).expect("begin");
        session.complete(first, Ok(())).expect("complete");

        let err = session
            .complete(first, Ok(()))
            .expect_err("ticket was already consumed");
        assert_eq!(err, AuthError::NoPendingRequest);
    }

    #[test]
    fn take_change_permission_is_one_shot() {
        let mut session = AccessSession::new();
        let ticket = session.begin(AuthReason::ChangeLockStatus).expect("begin");
        session.complete(ticket, Ok(())).expect("complete");

        assert!(session.take_change_permission());
        assert!(!session.take_change_permission());
        assert!(!session.are_changes_allowed());
    }

    #[test]
    fn app_phase_parses_host_lifecycle_names() {
        assert_eq!(AppPhase::parse("Paused"), Some(AppPhase::Inactive));
        assert_eq!(AppPhase::parse("background"), Some(AppPhase::Background));
        assert_eq!(AppPhase::parse("resumed"), Some(AppPhase::Active));
        assert_eq!(AppPhase::parse("sleeping"), None);
    }
}
