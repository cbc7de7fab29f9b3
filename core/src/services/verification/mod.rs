//! Verification session module for OTP-based phone verification
//!
//! This module provides the client side of the verification workflow:
//! - Phone submission and code sending through the OTP service
//! - Code confirmation with attempt tracking
//! - Resend cooldown gating and countdown handling
//! - Dispatch of service error codes onto user-facing error kinds
//! - Fencing of late responses after a reset

mod config;
mod countdown;
mod session;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use config::SessionConfig;
pub use countdown::{spawn_countdown, COUNTDOWN_PERIOD};
pub use session::{VerificationSession, VERIFIED_MESSAGE};
pub use traits::OtpServiceTrait;
pub use types::{
    IgnoreReason, SendOtpRequest, SendOtpResponse, SendOutcome, SessionView, VerifyOtpRequest,
    VerifyOtpResponse, VerifyOutcome,
};
