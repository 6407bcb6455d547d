//! Pure format validation helpers for GST identifiers.

/// Validate a 15-character GSTIN against the pattern
/// `[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]`.
pub fn validate_gstin(value: &str) -> bool {
    let b = value.as_bytes();
    if b.len() != 15 {
        return false;
    }
    b[0..2].iter().all(u8::is_ascii_digit)
        && b[2..7].iter().all(u8::is_ascii_uppercase)
        && b[7..11].iter().all(u8::is_ascii_digit)
        && b[11].is_ascii_uppercase()
        && (matches!(b[12], b'1'..=b'9') || b[12].is_ascii_uppercase())
        && b[13] == b'Z'
        && (b[14].is_ascii_digit() || b[14].is_ascii_uppercase())
}

/// Normalize an HSN/SAC code: strip non-digits and left-pad to at least four
/// digits. Longer codes pass through untruncated.
pub fn format_hsn_sac_code(code: &str) -> String {
    let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{:0>4}", digits)
}

/// Extract the two-digit state code prefix of a GSTIN, or empty if too short.
pub fn state_code_from_gstin(gstin: &str) -> String {
    gstin.get(0..2).unwrap_or("").to_string()
}
