//! # Upload Behavior - Attachment Placement Service
//!
//! Decides where uploaded files live on disk, under which URL they are served
//! and which thumbnails are derived from them, driven by a record's save and
//! delete lifecycle.
//!
//! ## Modules
//!
//! - [`services`] - The placement core: templates, naming, planning, thumbnails, lifecycle hooks
//! - [`models`] - Records, uploads, thumbnail profiles, configuration and host state
//! - [`handlers`] - HTTP handlers of the reference host
//! - [`utils`] - Filesystem seam, constants and environment settings

pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::error::PlacementResult;
use crate::handlers::{create_record, delete_record, get_record, health_check, update_record};
use crate::models::{AppState, PlacementConfig, Scenario};
use crate::services::UploadBehavior;
use crate::utils::constant::MAX_UPLOAD_SIZE;
use crate::utils::static_object::{BEHAVIOR_CONFIG, UPLOAD_BASE_URL, UPLOAD_ROOT};

/// Creates the API router around `state`.
///
/// Stored files are not served by this router; see [`app_with_files`].
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health-check", get(health_check))
        .route("/api/records", post(create_record))
        .route(
            "/api/records/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .with_state(state)
}

/// Creates the API router and serves the files under `root` at `url_prefix`.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `url_prefix` - Path the stored files are published under, e.g. `/uploads`
/// * `root` - Directory the behavior stores files in
pub fn app_with_files(state: Arc<AppState>, url_prefix: &str, root: impl AsRef<Path>) -> Router {
    app(state).nest_service(
        url_prefix.trim_end_matches('/'),
        ServeDir::new(root.as_ref()),
    )
}

/// Config used when no behavior config file is present: a plain file
/// attribute stored per record id.
pub fn default_config() -> PlacementConfig {
    PlacementConfig::new("file", "@webroot/records/{id}", "@web/records/{id}")
        .with_scenarios([Scenario::Insert, Scenario::Update])
}

/// Builds the router from the environment.
///
/// # Environment Variables
///
/// - `BEHAVIOR_CONFIG` - JSON behavior config, [`default_config`] when the file is missing
/// - `UPLOAD_ROOT` - Storage root, available to templates as `@webroot`
/// - `UPLOAD_BASE_URL` - Public prefix of the root, available as `@web`
///
/// # Errors
///
/// Fails if the config file exists but is malformed or invalid.
pub fn app_from_env() -> PlacementResult<Router> {
    let config_path = Path::new(BEHAVIOR_CONFIG.as_str());
    let config = if config_path.is_file() {
        info!(path = %config_path.display(), "Loading behavior config");
        PlacementConfig::from_file(config_path)?
    } else {
        warn!(path = %config_path.display(), "Behavior config not found, using defaults");
        default_config()
    };

    // Host roots always win over aliases of the same name in the file.
    let config = config
        .with_alias("webroot", UPLOAD_ROOT.as_str())
        .with_alias("web", UPLOAD_BASE_URL.as_str());

    let behavior = UploadBehavior::new(config)?;
    let state = Arc::new(AppState::new(behavior));

    if UPLOAD_BASE_URL.starts_with('/') {
        Ok(app_with_files(state, UPLOAD_BASE_URL.as_str(), UPLOAD_ROOT.as_str()))
    } else {
        info!(base_url = %UPLOAD_BASE_URL.as_str(), "Uploads are served externally");
        Ok(app(state))
    }
}
