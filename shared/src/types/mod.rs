//! Type definitions module
//!
//! - `response` - Response envelope used by the OTP service

pub mod response;

pub use response::ApiResponse;
