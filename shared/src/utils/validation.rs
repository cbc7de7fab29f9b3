//! OTP code validation and shared digit handling

/// Number of digits in a one-time passcode
pub const CODE_LENGTH: usize = 6;

/// Keep only ASCII digits from `raw`, stopping after `max_len` of them
pub fn digits_only(raw: &str, max_len: usize) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(max_len)
        .collect()
}

/// Normalize raw code input: keep digits only, at most 6 of them
pub fn normalize_code_input(raw: &str) -> String {
    digits_only(raw, CODE_LENGTH)
}

/// Check if a code is exactly six decimal digits
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}
