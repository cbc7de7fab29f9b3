//! # Infrastructure Layer
//!
//! Concrete implementations behind the verification core:
//! - **OTP**: HTTP adapter for the remote OTP service and an in-memory
//!   service for development
//! - **Config**: `.env` loading on top of the shared configuration types
//! - **Telemetry**: `tracing` subscriber setup

// Re-export core types for convenience
pub use pv_core::errors::*;

/// OTP service adapters
pub mod otp;

/// Configuration loading
pub mod config;

/// Tracing subscriber setup
pub mod telemetry;

pub use config::load_config;
pub use otp::{create_otp_service, HttpOtpService, MockOtpService};
pub use telemetry::init_tracing;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// HTTP client construction error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tracing subscriber error
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(#[from] anyhow::Error),
}
