//! # Application Constants
//!
//! This module defines configuration constants used throughout the crate.
//! These constants control thumbnail defaults, resource ceilings and upload limits.

/// Default working-set ceiling for a single thumbnail decode/encode
///
/// Applied per call through [`ResourceLimits`](crate::services::ResourceLimits)
/// unless a config overrides it.
pub const DEFAULT_MEMORY_LIMIT: u64 = 128 * 1024 * 1024;

/// Default encoder quality for thumbnails, on a 1-100 scale
pub const DEFAULT_THUMB_QUALITY: u8 = 100;

/// Default canvas colour behind inset thumbnails (white, fully transparent)
pub const DEFAULT_BACKGROUND: [u8; 4] = [255, 255, 255, 0];

/// Profile name assumed when a caller doesn't name one
pub const DEFAULT_PROFILE: &str = "thumb";

/// Separator between the profile name and the stored filename of a thumbnail
pub const THUMB_NAME_SEPARATOR: char = '-';

/// Character substituted for unsafe characters by the sanitize policy
pub const SANITIZE_REPLACEMENT: &str = "-";

/// Maximum accepted multipart body for the reference host
pub const MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024;
