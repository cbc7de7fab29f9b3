//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

use super::validation::digits_only;

/// Number of digits in a domestic mobile number
pub const PHONE_LENGTH: usize = 10;

// Vietnamese mobile number: leading 0, carrier prefix 3/5/7/8/9, eight more digits
static VIETNAM_MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0[35789][0-9]{8}$").unwrap()
});

/// Normalize raw phone input: keep digits only, at most 10 of them
pub fn normalize_phone_input(raw: &str) -> String {
    digits_only(raw, PHONE_LENGTH)
}

/// Check if a phone number is a valid Vietnamese mobile number
///
/// No normalization is applied; `"091 234 5678"` is rejected.
pub fn is_valid_phone(phone: &str) -> bool {
    VIETNAM_MOBILE_REGEX.is_match(phone)
}

/// Mask a phone number for logs (e.g., 09****5678)
pub fn mask_phone_number(phone: &str) -> String {
    let digits = digits_only(phone, usize::MAX);
    if digits.len() >= 7 {
        format!("{}****{}", &digits[0..2], &digits[digits.len() - 4..])
    } else {
        "****".to_string()
    }
}
