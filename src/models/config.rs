//! # Behavior Configuration
//!
//! [`PlacementConfig`] describes one attachment attribute: where its files go,
//! how they are named and which thumbnails are derived from them. Configs are
//! usually loaded from JSON and are checked once, when an
//! [`UploadBehavior`](crate::services::UploadBehavior) is built from them.
//!
//! ```json
//! {
//!   "attribute": "image",
//!   "scenarios": ["insert", "update"],
//!   "path": "@webroot/upload/user/{id}",
//!   "url": "@web/upload/user/{id}",
//!   "thumbs": [
//!     { "name": "thumb", "width": 400, "quality": 90 },
//!     { "name": "preview", "width": 200, "height": 200 }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{PlacementError, PlacementResult};
use crate::models::{Scenario, ThumbnailProfile};
use crate::utils::constant::DEFAULT_MEMORY_LIMIT;

/// Which built-in naming policy applies to new uploads.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum NamePolicyKind {
    /// Replace the client name with a unique token plus the original extension.
    #[default]
    Generate,
    /// Keep the client name with unsafe characters replaced.
    Sanitize,
}

/// A published placeholder image and the URL it is served under.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlaceholderAsset {
    pub path: PathBuf,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct PlacementConfig {
    /// Record field holding the stored filename.
    #[validate(length(min = 1, message = "the attribute must be set"))]
    pub attribute: String,
    #[serde(default = "default_scenarios")]
    pub scenarios: Vec<Scenario>,
    /// Directory template for stored files, e.g. `@webroot/upload/{id}`.
    #[validate(length(min = 1, message = "the path must be set"))]
    pub path: String,
    /// URL template for stored files, e.g. `@web/upload/{id}`.
    #[validate(length(min = 1, message = "the url must be set"))]
    pub url: String,
    #[serde(default)]
    pub thumb_path: Option<String>,
    #[serde(default)]
    pub thumb_url: Option<String>,
    #[serde(default)]
    pub thumbs: Vec<ThumbnailProfile>,
    /// `@alias` prefixes usable at the start of any template.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    #[serde(default)]
    pub name_policy: NamePolicyKind,
    #[serde(default = "enabled")]
    pub unlink_on_save: bool,
    #[serde(default = "enabled")]
    pub unlink_on_delete: bool,
    #[serde(default = "enabled")]
    pub delete_temp_file: bool,
    #[serde(default)]
    pub delete_empty_dir: bool,
    #[serde(default = "enabled")]
    pub create_thumbs_on_save: bool,
    #[serde(default)]
    pub create_thumbs_on_request: bool,
    #[serde(default)]
    pub delete_original_file: bool,
    #[serde(default)]
    pub placeholder: Option<PlaceholderAsset>,
    #[serde(default = "default_memory_limit")]
    pub memory_limit: Option<u64>,
}

fn default_scenarios() -> Vec<Scenario> {
    vec![Scenario::Default]
}

fn enabled() -> bool {
    true
}

fn default_memory_limit() -> Option<u64> {
    Some(DEFAULT_MEMORY_LIMIT)
}

impl PlacementConfig {
    /// Creates a plain (no thumbnails) config with default options.
    pub fn new(
        attribute: impl Into<String>,
        path: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            scenarios: default_scenarios(),
            path: path.into(),
            url: url.into(),
            thumb_path: None,
            thumb_url: None,
            thumbs: Vec::new(),
            aliases: HashMap::new(),
            name_policy: NamePolicyKind::default(),
            unlink_on_save: true,
            unlink_on_delete: true,
            delete_temp_file: true,
            delete_empty_dir: false,
            create_thumbs_on_save: true,
            create_thumbs_on_request: false,
            delete_original_file: false,
            placeholder: None,
            memory_limit: default_memory_limit(),
        }
    }

    /// Parses a config from JSON text.
    pub fn from_json(content: &str) -> PlacementResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| PlacementError::Configuration(format!("malformed config: {e}")))
    }

    /// Reads and parses a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> PlacementResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlacementError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    pub fn with_scenarios(mut self, scenarios: impl IntoIterator<Item = Scenario>) -> Self {
        self.scenarios = scenarios.into_iter().collect();
        self
    }

    pub fn with_thumbs(mut self, thumbs: impl IntoIterator<Item = ThumbnailProfile>) -> Self {
        self.thumbs = thumbs.into_iter().collect();
        self
    }

    pub fn with_thumb_location(
        mut self,
        thumb_path: impl Into<String>,
        thumb_url: impl Into<String>,
    ) -> Self {
        self.thumb_path = Some(thumb_path.into());
        self.thumb_url = Some(thumb_url.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>, value: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), value.into());
        self
    }

    pub fn with_placeholder(mut self, path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        self.placeholder = Some(PlaceholderAsset {
            path: path.into(),
            url: url.into(),
        });
        self
    }

    /// Directory template for thumbnails; the file template unless overridden.
    pub fn thumb_path_template(&self) -> &str {
        self.thumb_path.as_deref().unwrap_or(&self.path)
    }

    /// URL template for thumbnails; the file template unless overridden.
    pub fn thumb_url_template(&self) -> &str {
        self.thumb_url.as_deref().unwrap_or(&self.url)
    }

    /// Whether this attribute holds images with derived thumbnails.
    pub fn is_image(&self) -> bool {
        !self.thumbs.is_empty()
    }

    pub fn profile(&self, name: &str) -> Option<&ThumbnailProfile> {
        self.thumbs.iter().find(|profile| profile.name == name)
    }

    /// Checks required fields, thumbnail profiles and profile name uniqueness.
    pub fn check(&self) -> PlacementResult<()> {
        self.validate()
            .map_err(|e| PlacementError::Configuration(e.to_string()))?;

        let mut names = HashSet::new();
        for profile in &self.thumbs {
            profile.validate()?;
            if profile.name.is_empty() {
                return Err(PlacementError::Configuration(
                    "thumbnail profile name cannot be empty".to_string(),
                ));
            }
            if !names.insert(profile.name.as_str()) {
                return Err(PlacementError::Configuration(format!(
                    "duplicate thumbnail profile `{}`",
                    profile.name
                )));
            }
        }

        if self.memory_limit == Some(0) {
            return Err(PlacementError::Configuration(
                "memory_limit must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
