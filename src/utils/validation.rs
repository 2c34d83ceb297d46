pub const MAX_CV_BYTES: u64 = 10 * 1024 * 1024;

pub const ACCEPTED_CV_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_email_shaped(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// At least seven digits, spaces, `+`, `-` or parentheses.
pub fn is_phone_shaped(value: &str) -> bool {
    let value = value.trim();
    value.chars().count() >= 7
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
}

pub fn is_accepted_cv_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ACCEPTED_CV_TYPES.contains(&essence.as_str())
}

/// Content type implied by a CV's file extension.
pub fn cv_type_for_filename(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        ACCEPTED_CV_TYPES[0]
    } else if lower.ends_with(".docx") {
        ACCEPTED_CV_TYPES[2]
    } else if lower.ends_with(".doc") {
        ACCEPTED_CV_TYPES[1]
    } else {
        "application/octet-stream"
    }
}
