//! Status code reason phrases.

use http::StatusCode;

/// Returns the standard reason phrase for `status`.
///
/// Only the common codes between 100 and 505 have a phrase. Any other code
/// yields `None`.
#[must_use]
pub fn reason_phrase(status: u16) -> Option<&'static str> {
    if !is_tabled(status) {
        return None;
    }
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
}

fn is_tabled(status: u16) -> bool {
    matches!(
        status,
        100 | 101 | 200..=207 | 300..=307 | 400..=417 | 422 | 500..=505
    )
}
