use chrono::{DateTime, Utc};

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<namespace>/<job-id or "unknown">/<millis>-<sanitized filename>`
pub fn storage_key(namespace: &str, job_id: &str, filename: &str, at: DateTime<Utc>) -> String {
    let job = job_id.trim();
    let job = if job.is_empty() {
        "unknown".to_string()
    } else {
        sanitize_filename(job)
    };
    format!(
        "{}/{}/{}-{}",
        namespace.trim_matches('/'),
        job,
        at.timestamp_millis(),
        sanitize_filename(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn strips_path_separators_and_spaces() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("My CV (final).pdf"), "My_CV__final_.pdf");
        assert_eq!(sanitize_filename("résumé.docx"), "r_sum_.docx");
    }

    #[test]
    fn key_groups_by_job_and_defaults_to_unknown() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            storage_key("cvs", "42", "cv.pdf", at),
            "cvs/42/1700000000123-cv.pdf"
        );
        assert_eq!(
            storage_key("cvs", "", "cv.pdf", at),
            "cvs/unknown/1700000000123-cv.pdf"
        );
        assert_eq!(
            storage_key("cvs", "a/b", "x y.pdf", at),
            "cvs/a_b/1700000000123-x_y.pdf"
        );
    }
}
