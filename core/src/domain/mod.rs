//! Domain layer: session state and service-reported rate limits.

pub mod rate_limit;
pub mod session_state;

pub use rate_limit::{RateLimitSignals, RateLimitTracker};
pub use session_state::{
    SessionState, Step, DEFAULT_TTL_SECONDS, RESEND_COOLDOWN_SECONDS, RESEND_THRESHOLD_SECONDS,
};
