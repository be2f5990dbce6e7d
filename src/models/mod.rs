pub mod application;
pub mod form_field;
pub mod job_offer;
pub mod user;

/// Normalizes an enum label from the wire ("fixed-term", "Fixed Term", "FIXED_TERM")
/// into the SCREAMING_SNAKE_CASE form used in the database.
pub(crate) fn normalize_label(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}
