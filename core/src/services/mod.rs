//! Services containing the verification flow logic.

pub mod verification;

// Re-export commonly used types
pub use verification::{
    spawn_countdown, IgnoreReason, OtpServiceTrait, SendOtpRequest, SendOtpResponse,
    SendOutcome, SessionConfig, SessionView, VerificationSession, VerifyOtpRequest,
    VerifyOtpResponse, VerifyOutcome, COUNTDOWN_PERIOD, VERIFIED_MESSAGE,
};
