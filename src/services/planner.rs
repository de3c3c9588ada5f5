//! # Placement Planner
//!
//! Computes where a record's file and its thumbnails live on disk and under
//! which URLs they are served. Nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use crate::error::PlacementResult;
use crate::models::{HostRecord, PlacementConfig, stored_file_name};
use crate::services::template::{AliasMap, resolve};
use crate::utils::constant::THUMB_NAME_SEPARATOR;

/// Absolute path and public URL of one placed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlacement {
    pub absolute_path: PathBuf,
    pub public_url: String,
}

/// Name of the `profile` derivative of `file_name`: `{profile}-{file_name}`.
pub fn thumb_file_name(file_name: &str, profile: &str) -> String {
    format!("{profile}{THUMB_NAME_SEPARATOR}{file_name}")
}

/// Joins a URL base and a file name with exactly one `/`.
pub fn join_url(base: &str, file_name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), file_name)
}

#[derive(Debug, Clone)]
pub struct PlacementPlanner {
    config: PlacementConfig,
    aliases: AliasMap,
}

impl PlacementPlanner {
    /// Builds a planner, rejecting templates that use unknown aliases.
    pub fn new(config: PlacementConfig) -> PlacementResult<Self> {
        let aliases = AliasMap::new(config.aliases.clone());
        for template in [
            config.path.as_str(),
            config.url.as_str(),
            config.thumb_path_template(),
            config.thumb_url_template(),
        ] {
            aliases.check(template)?;
        }

        Ok(Self { config, aliases })
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// The stored filename, either as currently staged or as last persisted.
    pub fn file_name<'r, R: HostRecord + ?Sized>(
        &self,
        record: &'r R,
        attribute: &str,
        old: bool,
    ) -> Option<&'r str> {
        let value = if old {
            record.old_attribute(attribute)
        } else {
            record.attribute(attribute)
        };
        stored_file_name(value)
    }

    fn directory<R: HostRecord + ?Sized>(&self, template: &str, record: &R) -> PathBuf {
        PathBuf::from(self.aliases.expand(&resolve(template, record)))
    }

    fn url_base<R: HostRecord + ?Sized>(&self, template: &str, record: &R) -> String {
        self.aliases.expand(&resolve(template, record))
    }

    /// Absolute path of the attribute's file, `None` when nothing is stored.
    pub fn upload_path<R: HostRecord + ?Sized>(
        &self,
        record: &R,
        attribute: &str,
        old: bool,
    ) -> Option<PathBuf> {
        let file_name = self.file_name(record, attribute, old)?;
        Some(self.directory(&self.config.path, record).join(file_name))
    }

    /// Public URL of the attribute's persisted file.
    pub fn upload_url<R: HostRecord + ?Sized>(&self, record: &R, attribute: &str) -> Option<String> {
        let file_name = self.file_name(record, attribute, true)?;
        Some(join_url(&self.url_base(&self.config.url, record), file_name))
    }

    pub fn thumb_upload_path<R: HostRecord + ?Sized>(
        &self,
        record: &R,
        attribute: &str,
        profile: &str,
        old: bool,
    ) -> Option<PathBuf> {
        let file_name = self.file_name(record, attribute, old)?;
        Some(
            self.directory(self.config.thumb_path_template(), record)
                .join(thumb_file_name(file_name, profile)),
        )
    }

    /// Public URL of a thumbnail of the persisted file. Does not check that
    /// the thumbnail exists.
    pub fn thumb_upload_url<R: HostRecord + ?Sized>(
        &self,
        record: &R,
        attribute: &str,
        profile: &str,
    ) -> Option<String> {
        let file_name = self.file_name(record, attribute, true)?;
        Some(join_url(
            &self.url_base(self.config.thumb_url_template(), record),
            &thumb_file_name(file_name, profile),
        ))
    }

    /// Path and URL of the attribute's file together.
    pub fn primary<R: HostRecord + ?Sized>(
        &self,
        record: &R,
        attribute: &str,
    ) -> Option<ResolvedPlacement> {
        Some(ResolvedPlacement {
            absolute_path: self.upload_path(record, attribute, true)?,
            public_url: self.upload_url(record, attribute)?,
        })
    }

    pub fn thumbnail<R: HostRecord + ?Sized>(
        &self,
        record: &R,
        attribute: &str,
        profile: &str,
    ) -> Option<ResolvedPlacement> {
        Some(ResolvedPlacement {
            absolute_path: self.thumb_upload_path(record, attribute, profile, true)?,
            public_url: self.thumb_upload_url(record, attribute, profile)?,
        })
    }

    /// Where the `profile` thumbnail of the placeholder asset lives, next to
    /// the asset itself.
    pub fn placeholder_thumb(&self, profile: &str) -> Option<ResolvedPlacement> {
        let asset = self.config.placeholder.as_ref()?;
        let asset_path = self.placeholder_source()?;
        let file_name = asset_path.file_name()?.to_str()?.to_string();
        let thumb_name = thumb_file_name(&file_name, profile);

        let directory = asset_path.parent().map(Path::to_path_buf).unwrap_or_default();
        let url = self.aliases.expand(&asset.url);
        // A bare file name sits in the current directory, not the site root.
        let url_base = url.rsplit_once('/').map(|(base, _)| base).unwrap_or(".");

        Some(ResolvedPlacement {
            absolute_path: directory.join(&thumb_name),
            public_url: join_url(url_base, &thumb_name),
        })
    }

    /// Resolved path of the placeholder asset itself.
    pub fn placeholder_source(&self) -> Option<PathBuf> {
        let asset = self.config.placeholder.as_ref()?;
        Some(PathBuf::from(self.aliases.expand(&asset.path.to_string_lossy())))
    }
}
