//! # Filename Policy
//!
//! Decides the name an upload is stored under. The client's name is never
//! trusted as-is: it is either replaced by a unique token, sanitized, or
//! handed to a caller-supplied generator.

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use time::OffsetDateTime;

use crate::error::{PlacementError, PlacementResult};
use crate::models::{NamePolicyKind, StoredFile};
use crate::utils::{constant::SANITIZE_REPLACEMENT, validator::UNSAFE_FILENAME_REGEX};

/// Caller-supplied naming function. Receives the upload's metadata and
/// returns the name to store it under.
pub type NameGenerator = Arc<dyn Fn(&StoredFile) -> String + Send + Sync>;

#[derive(Clone)]
pub enum NamePolicy {
    Generate,
    Sanitize,
    Custom(NameGenerator),
}

impl fmt::Debug for NamePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamePolicy::Generate => f.write_str("Generate"),
            NamePolicy::Sanitize => f.write_str("Sanitize"),
            NamePolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<NamePolicyKind> for NamePolicy {
    fn from(kind: NamePolicyKind) -> Self {
        match kind {
            NamePolicyKind::Generate => NamePolicy::Generate,
            NamePolicyKind::Sanitize => NamePolicy::Sanitize,
        }
    }
}

/// Returns the stored name for `file` under `policy`.
///
/// # Errors
///
/// [`PlacementError::EmptyFileName`] when the policy produced nothing usable.
/// Callers sanitizing a name decide themselves whether to fall back to
/// [`generate_file_name`].
pub fn name_for(file: &StoredFile, policy: &NamePolicy) -> PlacementResult<String> {
    let name = match policy {
        NamePolicy::Generate => generate_file_name(file.extension()),
        NamePolicy::Sanitize => sanitize_file_name(file.original_name()),
        NamePolicy::Custom(generator) => generator(file),
    };

    if name.is_empty() {
        return Err(PlacementError::EmptyFileName);
    }
    Ok(name)
}

/// Builds a unique name: a time-based hex token, random digits and the
/// extension.
///
/// # Examples
///
/// `generate_file_name(".JPG")` → `66f1c2a30b1f23012345678.jpg`
pub fn generate_file_name(extension: &str) -> String {
    let now = OffsetDateTime::now_utc();
    let entropy: u32 = rand::rng().random_range(0..100_000_000);
    let token = format!(
        "{:08x}{:05x}{:08}",
        now.unix_timestamp(),
        now.microsecond(),
        entropy
    );

    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    if extension.is_empty() {
        token
    } else {
        format!("{token}.{extension}")
    }
}

/// Replaces characters that are unsafe in a filename with `-`.
///
/// # Examples
///
/// - `report 2024.pdf` → `report-2024.pdf`
/// - `#my  unsaf&filename?".png` → `-my--unsaf-filename--.png`
/// - `..` → empty, dot-only names would address a directory
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized = UNSAFE_FILENAME_REGEX
        .replace_all(name, SANITIZE_REPLACEMENT)
        .into_owned();

    if sanitized.chars().all(|c| c == '.') {
        return String::new();
    }
    sanitized
}
