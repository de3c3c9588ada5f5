use std::env;
use std::sync::LazyLock;

use tracing::error;

/// Root directory the reference host stores uploads under.
///
/// Exposed to behavior templates as the `@webroot` alias.
pub static UPLOAD_ROOT: LazyLock<String> = LazyLock::new(|| {
    env::var("UPLOAD_ROOT").unwrap_or_else(|_| {
        error!("Missing UPLOAD_ROOT env var, using fallback './uploads'");
        "./uploads".to_string()
    })
});

/// Public URL prefix the upload root is served under.
///
/// Exposed to behavior templates as the `@web` alias.
pub static UPLOAD_BASE_URL: LazyLock<String> = LazyLock::new(|| {
    env::var("UPLOAD_BASE_URL").unwrap_or_else(|_| {
        error!("Missing UPLOAD_BASE_URL env var, using fallback '/uploads'");
        "/uploads".to_string()
    })
});

/// Path of the JSON file holding the behavior configuration.
pub static BEHAVIOR_CONFIG: LazyLock<String> = LazyLock::new(|| {
    env::var("BEHAVIOR_CONFIG").unwrap_or_else(|_| {
        error!("Missing BEHAVIOR_CONFIG env var, using fallback 'behavior.json'");
        "behavior.json".to_string()
    })
});

pub static BIND_ADDR: LazyLock<String> = LazyLock::new(|| {
    env::var("BIND_ADDR").unwrap_or_else(|_| {
        error!("Missing BIND_ADDR env var, using fallback '0.0.0.0:8090'");
        "0.0.0.0:8090".to_string()
    })
});
