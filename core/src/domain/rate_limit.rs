//! Remaining-quota counters reported by the OTP service.

use serde::{Deserialize, Serialize};

/// Rate-limit counters attached to a single send response
///
/// The service only reports a counter when it has a value for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSignals {
    /// Sends left for this phone number
    pub remaining_phone: Option<u32>,
    /// Sends left for this client origin
    pub remaining_ip: Option<u32>,
}

impl RateLimitSignals {
    pub fn new(remaining_phone: Option<u32>, remaining_ip: Option<u32>) -> Self {
        Self {
            remaining_phone,
            remaining_ip,
        }
    }
}

/// Last known remaining-quota counters
///
/// An absent signal keeps the previous value so the last known count stays
/// visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitTracker {
    remaining_phone: Option<u32>,
    remaining_ip: Option<u32>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining_phone(&self) -> Option<u32> {
        self.remaining_phone
    }

    pub fn remaining_ip(&self) -> Option<u32> {
        self.remaining_ip
    }

    /// Both counters, phone first
    pub fn counters(&self) -> (Option<u32>, Option<u32>) {
        (self.remaining_phone, self.remaining_ip)
    }

    /// True when nothing has been reported yet
    pub fn is_empty(&self) -> bool {
        self.remaining_phone.is_none() && self.remaining_ip.is_none()
    }

    /// Record the counters present in `signals`
    pub fn observe(&mut self, signals: &RateLimitSignals) {
        if let Some(remaining) = signals.remaining_phone {
            self.remaining_phone = Some(remaining);
        }
        if let Some(remaining) = signals.remaining_ip {
            self.remaining_ip = Some(remaining);
        }
    }
}
