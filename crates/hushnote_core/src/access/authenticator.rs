//! External authenticator capability and its error taxonomy.
//!
//! # Responsibility
//! - Define the device-auth contract the access session delegates to.
//! - Classify authentication failures into user-facing messages.
//!
//! # Invariants
//! - `evaluate` is only called after `can_evaluate` returned `true`.
//! - Error messages never contain note data.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Device authentication policy requested from the authenticator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Biometrics with device passcode fallback.
    DeviceOwnerAuthentication,
}

/// Why the session asks for authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthReason {
    /// Grants read access to private notes for the session.
    ViewNotes,
    /// Grants one lock-status toggle.
    ChangeLockStatus,
}

impl AuthReason {
    /// Localized reason shown in the system prompt.
    pub fn prompt(self) -> &'static str {
        match self {
            Self::ViewNotes => "Unlock to view private notes",
            Self::ChangeLockStatus => "Unlock to change the lock status of a note",
        }
    }

    /// Stable label used in logs and FFI payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ViewNotes => "view_notes",
            Self::ChangeLockStatus => "change_lock_status",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "view_notes" => Some(Self::ViewNotes),
            "change_lock_status" => Some(Self::ChangeLockStatus),
            _ => None,
        }
    }
}

/// Classified authentication failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The device cannot evaluate the policy at all; nothing was prompted.
    Unavailable,
    /// The user presented a credential that did not match.
    Failed,
    /// The user dismissed the prompt.
    UserCancelled,
    /// Biometric hardware is missing or disabled.
    BiometryUnavailable,
    /// Biometric hardware exists but has no enrolled identity.
    BiometryNotEnrolled,
    /// Another authentication request is still pending.
    Busy,
    /// A completion arrived for a request the session is not waiting on.
    NoPendingRequest,
    /// Any other authenticator-reported failure.
    Other(String),
}

impl AuthError {
    /// Human-readable message for display.
    pub fn message(&self) -> String {
        match self {
            Self::Unavailable => {
                "This device cannot authenticate you. Set up a passcode or biometrics in Settings."
                    .to_string()
            }
            Self::Failed => "Authentication failed. Please try again.".to_string(),
            Self::UserCancelled => "Authentication was cancelled.".to_string(),
            Self::BiometryUnavailable => "Biometric authentication is not available.".to_string(),
            Self::BiometryNotEnrolled => {
                "No biometric identity is enrolled on this device.".to_string()
            }
            Self::Busy => "An authentication request is already in progress.".to_string(),
            Self::NoPendingRequest => "No authentication request is in progress.".to_string(),
            Self::Other(details) => format!("Authentication error: {details}"),
        }
    }

    /// Whether the failure blocks the gated operation until device settings
    /// change, as opposed to a dismissible retryable failure.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::Unavailable | Self::BiometryUnavailable | Self::BiometryNotEnrolled
        )
    }

    /// Stable short code used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Failed => "failed",
            Self::UserCancelled => "user_cancel",
            Self::BiometryUnavailable => "biometry_unavailable",
            Self::BiometryNotEnrolled => "biometry_not_enrolled",
            Self::Busy => "busy",
            Self::NoPendingRequest => "no_pending_request",
            Self::Other(_) => "other",
        }
    }

    /// Maps an outcome code reported by an external prompt.
    ///
    /// Unknown codes fall back to `Other` carrying `details`.
    pub fn from_code(code: &str, details: &str) -> Self {
        match code.trim() {
            "unavailable" => Self::Unavailable,
            "failed" => Self::Failed,
            "user_cancel" => Self::UserCancelled,
            "biometry_unavailable" => Self::BiometryUnavailable,
            "biometry_not_enrolled" => Self::BiometryNotEnrolled,
            _ => Self::Other(details.to_string()),
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl Error for AuthError {}

/// Device authentication capability.
///
/// `evaluate` suspends the calling thread until the external prompt
/// resolves; hosts that must prompt elsewhere use the session's two-phase
/// `begin`/`complete` API instead.
pub trait Authenticator {
    /// Whether the device can evaluate `policy` without prompting.
    fn can_evaluate(&self, policy: AuthPolicy) -> bool;
    /// Prompts the user and reports the outcome.
    fn evaluate(&self, policy: AuthPolicy, reason: AuthReason) -> Result<(), AuthError>;
}

/// Authenticator for hosts without any device authentication.
///
/// Every gated request fails with `AuthError::Unavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeviceAuthenticator;

impl Authenticator for NoDeviceAuthenticator {
    fn can_evaluate(&self, _policy: AuthPolicy) -> bool {
        false
    }

    fn evaluate(&self, _policy: AuthPolicy, _reason: AuthReason) -> Result<(), AuthError> {
        Err(AuthError::Unavailable)
    }
}
