//! Cheap input checks that run before any upstream call.

/// Lowest numeric German postal code accepted ("01001").
pub const MIN_POSTAL_CODE: u32 = 1001;
/// Highest numeric German postal code accepted.
pub const MAX_POSTAL_CODE: u32 = 99998;

/// Content types a client may declare for the uploaded photo.
///
/// Matching is exact and case-sensitive; `IMAGE/PNG` or `image/png; q=1` are rejected.
pub const ACCEPTED_IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Exactly five ASCII digits within `MIN_POSTAL_CODE..=MAX_POSTAL_CODE`.
pub fn is_valid_postal_code(code: &str) -> bool {
    if code.len() != 5 || !code.bytes().all(|byte| byte.is_ascii_digit()) {
        return false;
    }

    code.parse::<u32>()
        .map(|value| (MIN_POSTAL_CODE..=MAX_POSTAL_CODE).contains(&value))
        .unwrap_or(false)
}

pub fn is_valid_image_type(declared_content_type: &str) -> bool {
    ACCEPTED_IMAGE_TYPES.contains(&declared_content_type)
}
