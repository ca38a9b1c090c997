//! Key sanitizer for domain, subject and prefix names.
//!
//! Every name that ends up in a file name or a store key goes through
//! [`sanitize`]: the result only contains `[a-z0-9-]`, so it is safe as a path
//! component and as a key segment. Distinct inputs may map to the same token
//! (`"Video.mp4"` and `"video mp4"` both become `video-mp4`).

use crate::error::{ProcmanError, Result};
use regex::Regex;
use std::sync::LazyLock;

static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid sanitizer regex"));

/// Lowercase `raw` and collapse every run of other characters into one `-`.
pub fn sanitize(raw: &str) -> String {
    UNSAFE_RUN
        .replace_all(&raw.to_lowercase(), "-")
        .into_owned()
}

/// Sanitize `raw`, rejecting names that leave nothing usable behind.
///
/// `kind` names the value in the error message ("domain", "subject", ...).
pub fn sanitize_name(kind: &str, raw: &str) -> Result<String> {
    let token = sanitize(raw);
    if token.is_empty() || token == "-" {
        return Err(ProcmanError::InvalidName(format!(
            "{} '{}' has no alphanumeric characters",
            kind, raw
        )));
    }
    Ok(token)
}
