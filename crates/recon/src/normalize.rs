//! Field normalisation shared by the constraint chain.

use chrono::NaiveDateTime;

/// Timestamp layout of `date_acte`, both in the CSV and in the database projection.
pub const ACT_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Trim + lower-case. Equality under this is the default field comparison.
pub fn normalize_text(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn text_eq(left: &str, right: &str) -> bool {
    normalize_text(left) == normalize_text(right)
}

/// Parse plain decimal text (`12`, `-2.5`, `.5`, `1e3`). Rejects `inf`, `nan`, and blanks.
pub fn parse_numeric(value: &str) -> Option<f64> {
    let value = value.trim();
    if !value.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if !value
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    value.parse::<f64>().ok()
}

/// Compare `activite_ou_coeff` values.
///
/// The submitted side may use a decimal comma. When both sides are numeric they are
/// compared as `f64` with exact equality (NGAP coefficients); otherwise as
/// case-insensitive text (CCAM activity codes).
pub fn coefficients_eq(submitted: &str, candidate: &str) -> bool {
    let submitted = submitted.trim();
    let candidate = candidate.trim();
    let submitted_decimal = submitted.replace(',', ".");

    match (parse_numeric(&submitted_decimal), parse_numeric(candidate)) {
        (Some(a), Some(b)) => a == b,
        _ => submitted.to_lowercase() == candidate.to_lowercase(),
    }
}

pub fn parse_act_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), ACT_DATE_FORMAT).ok()
}
