//! Validation and sharing URLs

/// Path and query prefix appended to the base URL for validation links
const VALIDATION_PATH: &str = "validate?code=";

const LINKEDIN_SHARE_PREFIX: &str = "https://www.linkedin.com/sharing/share-offsite/?url=";

/// Make sure `base_url` ends with exactly one `/`.
pub fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim_end_matches('/'))
}

/// Build `<base_url>/validate?code=<code>` with a single separator.
pub fn validation_url(base_url: &str, code: &str) -> String {
    format!("{}{}{}", normalize_base_url(base_url), VALIDATION_PATH, code)
}

/// LinkedIn share link for a validation URL
pub fn linkedin_share_url(validation_url: &str) -> String {
    format!(
        "{}{}",
        LINKEDIN_SHARE_PREFIX,
        urlencoding::encode(validation_url)
    )
}
