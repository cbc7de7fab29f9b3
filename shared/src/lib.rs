//! Shared utilities and common types for the PhoneVerify client
//!
//! This crate provides functionality used across the client crates:
//! - Configuration types
//! - Wire envelope and reserved error codes of the OTP service
//! - Input validation and normalization (phone numbers, OTP codes)

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{AppConfig, Environment, LogFormat, LoggingConfig, OtpClientConfig};
pub use errors::{error_codes, ErrorBody};
pub use types::ApiResponse;
pub use utils::{phone, validation};
