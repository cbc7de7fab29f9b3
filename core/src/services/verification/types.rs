//! Request, response, and outcome types of the verification session

use serde::{Deserialize, Serialize};

use crate::domain::{RateLimitSignals, SessionState};

/// Request to deliver a passcode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    /// 10-digit phone number
    pub phone: String,
    /// Channels to try in order; service default when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_channels: Vec<String>,
}

impl SendOtpRequest {
    pub fn new(phone: impl Into<String>, preferred_channels: Vec<String>) -> Self {
        Self {
            phone: phone.into(),
            preferred_channels,
        }
    }
}

/// Successful send, as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    /// Delivery channel actually used (e.g. "sms", "zalo")
    pub channel: String,
    /// Correlation token for the verify call
    pub request_id: String,
    /// Validity window of the code in seconds
    pub ttl_seconds: u32,
    /// Phone number masked for display
    pub masked_phone: String,
    /// Out-of-band quota counters; not part of the response body
    #[serde(skip)]
    pub rate_limits: RateLimitSignals,
}

/// Request to confirm a passcode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub code: String,
    pub request_id: String,
}

/// Result of a verify call that reached the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub verified: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<u32>,
}

/// Why a session call did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Another send or verify is still outstanding
    Busy,
    /// The resend cooldown has not elapsed
    CooldownActive,
    /// The session was reset while the call was outstanding
    Stale,
}

/// Outcome of a send or resend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The code was sent and the session awaits it
    Sent,
    Ignored(IgnoreReason),
}

/// Outcome of a verify
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The phone number is confirmed
    Verified,
    /// The service did not accept the code; `last_error` holds its message
    Rejected { remaining_attempts: Option<u32> },
    Ignored(IgnoreReason),
}

/// Everything a presentation layer reads from a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub state: SessionState,
    /// A send or verify is outstanding
    pub busy: bool,
    /// Resend can be issued now
    pub resend_allowed: bool,
    /// Seconds until resend unlocks
    pub resend_available_in: u32,
}

impl SessionView {
    pub(crate) fn new(state: SessionState, busy: bool) -> Self {
        Self {
            resend_allowed: !busy && state.resend_allowed(),
            resend_available_in: state.resend_available_in(),
            busy,
            state,
        }
    }

    /// Both rate-limit counters, phone first
    pub fn rate_limits(&self) -> (Option<u32>, Option<u32>) {
        self.state.rate_limits.counters()
    }
}
