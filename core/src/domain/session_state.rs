//! State of a single verification attempt.

use crate::errors::VerificationError;

use super::rate_limit::RateLimitTracker;

/// Validity window the OTP service issues codes with (5 minutes)
pub const DEFAULT_TTL_SECONDS: u32 = 300;

/// Minimum time a code must have been valid before a resend is allowed
pub const RESEND_COOLDOWN_SECONDS: u32 = 60;

/// Resend is allowed once the countdown is at or below this value
pub const RESEND_THRESHOLD_SECONDS: u32 = DEFAULT_TTL_SECONDS - RESEND_COOLDOWN_SECONDS;

/// Stage of the verification flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Step {
    /// Waiting for a phone number and a successful send
    #[default]
    AwaitingPhone,
    /// A code was sent; waiting for the user to confirm it
    AwaitingCode,
}

/// Snapshot of a verification session
///
/// `Default` is the initial state: empty phone, code and request id, no
/// countdown, no messages or counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub step: Step,
    /// Normalized digits, at most 10
    pub phone: String,
    /// Normalized digits, at most 6
    pub code: String,
    /// Correlation token of the last successful send; empty before one
    pub request_id: String,
    /// Seconds left for the current code
    pub ttl_remaining_seconds: u32,
    /// Attempts left, as reported by the last failed verify
    pub remaining_attempts: Option<u32>,
    pub last_error: Option<VerificationError>,
    pub last_info: Option<String>,
    pub rate_limits: RateLimitTracker,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the resend cooldown has elapsed
    pub fn resend_allowed(&self) -> bool {
        self.ttl_remaining_seconds <= RESEND_THRESHOLD_SECONDS
    }

    /// Seconds until resend unlocks, 0 when already allowed
    pub fn resend_available_in(&self) -> u32 {
        self.ttl_remaining_seconds
            .saturating_sub(RESEND_THRESHOLD_SECONDS)
    }

    pub fn is_code_expired(&self) -> bool {
        self.step == Step::AwaitingCode && self.ttl_remaining_seconds == 0
    }

    pub(crate) fn clear_messages(&mut self) {
        self.last_error = None;
        self.last_info = None;
    }

    /// Count down one second; no-op at zero
    pub(crate) fn tick(&mut self) -> u32 {
        self.ttl_remaining_seconds = self.ttl_remaining_seconds.saturating_sub(1);
        self.ttl_remaining_seconds
    }

    /// Drop the burnt request id and send the user back to the phone step
    ///
    /// The phone number is kept so the user can send again directly.
    pub(crate) fn restart_from_phone(&mut self) {
        self.step = Step::AwaitingPhone;
        self.request_id.clear();
        self.code.clear();
        self.ttl_remaining_seconds = 0;
        self.remaining_attempts = None;
        self.rate_limits = RateLimitTracker::default();
    }
}
