//! Shared error body and reserved error codes of the OTP service

use serde::{Deserialize, Serialize};

/// Error body returned by the OTP service on rejected requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Service error code
    pub code: String,

    /// Human-readable error message
    #[serde(default)]
    pub message: String,
}

impl ErrorBody {
    /// Create a new error body
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Error codes used by the OTP service envelope
pub mod error_codes {
    /// Request succeeded
    pub const SUCCESS: &str = "0";
    /// The phone number is not a valid mobile number
    pub const INVALID_PHONE: &str = "2005";
    /// The passcode behind a request id has expired
    pub const OTP_EXPIRED: &str = "10006";
    /// The submitted passcode did not match
    pub const OTP_VERIFICATION_FAILED: &str = "10007";
    /// The request id has used up its verification attempts
    pub const OTP_ATTEMPTS_EXCEEDED: &str = "10008";
    /// Sending the passcode failed on every channel
    pub const OTP_SEND_FAILED: &str = "10009";
    /// Too many sends for this phone or origin
    pub const OTP_RATE_LIMITED: &str = "10010";
}
