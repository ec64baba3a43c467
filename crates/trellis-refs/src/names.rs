//! Ref name validation following git-style conventions.
//!
//! A valid branch or tag name:
//! - is non-empty
//! - contains no whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - contains neither `..` nor `@{`
//! - does not start or end with `/`, and does not end with `.` or `.lock`
//! - has no empty components and no component starting with `.`

use crate::error::{RefError, Result};

const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a branch name.
///
/// ```
/// use trellis_refs::names::validate_branch_name;
///
/// assert!(validate_branch_name("main").is_ok());
/// assert!(validate_branch_name("feature/auth").is_ok());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "must not be empty"));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }
    for sequence in ["..", "@{"] {
        if name.contains(sequence) {
            return Err(invalid(name, format!("must not contain '{sequence}'")));
        }
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }
    if name.ends_with('.') || name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.' or '.lock'"));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }
    Ok(())
}

/// Validate a tag name. Same rules as branch names.
pub fn validate_tag_name(name: &str) -> Result<()> {
    validate_branch_name(name)
}

/// Validate a remote name: a single component, otherwise like a branch.
pub fn validate_remote_name(name: &str) -> Result<()> {
    if name.contains('/') {
        return Err(invalid(name, "remote name must not contain '/'"));
    }
    validate_branch_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["main", "my-branch", "v1.0", "feature/auth", "user/alice/fix-123"] {
            assert!(validate_branch_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn reject_empty_and_forbidden_chars() {
        assert!(validate_branch_name("").is_err());
        for name in ["has space", "a\tb", "a~b", "a^b", "a:b", "a?b", "a*b", "a[b", "a\\b"] {
            assert!(validate_branch_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn reject_sequences_and_boundaries() {
        for name in [
            "bad..name",
            "ref@{0}",
            "/leading",
            "trailing/",
            "trailing.",
            "main.lock",
            "a//b",
            ".hidden",
            "feature/.hidden",
        ] {
            assert!(validate_branch_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn remote_names_are_single_component() {
        assert!(validate_remote_name("origin").is_ok());
        assert!(validate_remote_name("up/stream").is_err());
        assert!(validate_remote_name("").is_err());
    }
}
