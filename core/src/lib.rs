//! # PhoneVerify Core
//!
//! Client-side core of the two-step phone verification flow: request a
//! one-time passcode, then confirm it. This crate contains the session state
//! machine, the contract of the remote OTP service it drives, and the error
//! types surfaced to the presentation layer.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
