//! # Text Pattern Utilities
//!
//! Compiled regular expressions shared by the template resolver and the
//! filename policy.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a `{name}` placeholder, capturing `name`.
///
/// # Examples
///
/// - `upload/{id}/images` → captures `id`
/// - `upload/{}` → no match, empty names are not placeholders
pub static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("Failed to compile placeholder regex"));

/// Matches a leading `@alias` segment, capturing the alias name.
///
/// # Examples
///
/// - `@webroot/upload` → captures `webroot`
/// - `upload/@webroot` → no match
pub static ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([^/\\]+)").expect("Failed to compile alias regex"));

/// Matches a single character that is unsafe in a stored filename.
///
/// Covers space, `"`, `'`, `&`, `/`, `\`, `?`, `#` and ASCII control characters.
pub static UNSAFE_FILENAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[ "'&/\\?#\x00-\x1f\x7f]"#).expect("Failed to compile filename regex")
});
