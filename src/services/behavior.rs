//! # Upload Lifecycle
//!
//! [`UploadBehavior`] ties naming, placement and thumbnails to a record's
//! save/delete lifecycle. Hosts call the hooks explicitly from their own
//! transaction code:
//!
//! ```text
//! let mut cycle = behavior.begin_cycle();
//! cycle.before_validate(&mut record, upload)?;   // stage + rename
//! /* host validation */
//! cycle.before_save(&mut record).await?;         // unlink replaced file
//! /* host insert/update, then record.mark_persisted() */
//! cycle.after_save(&record).await?;              // write file + thumbnails
//!
//! behavior.after_delete(&record).await?;         // after the host deleted it
//! ```
//!
//! Whether the attribute holds plain files or images with thumbnails is a
//! matter of configuration: any configured thumbnail profile turns the image
//! handling on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{PlacementError, PlacementResult};
use crate::models::{HostRecord, PlacementConfig, Scenario, StoredFile};
use crate::services::filename::{NamePolicy, generate_file_name, name_for};
use crate::services::planner::PlacementPlanner;
use crate::services::template::has_placeholders;
use crate::services::thumbnail::{
    ImageCodec, ImageRsCodec, ResourceLimits, ThumbnailGenerator, ThumbnailOutcome,
    ThumbnailReport,
};
use crate::utils::file::{FileManager, Filesystem, LocalFilesystem};

/// Attachment handling for one attribute of a record type.
///
/// Holds no per-record state and can be shared between requests; the state of
/// a single save lives in a [`SaveCycle`].
#[derive(Clone)]
pub struct UploadBehavior {
    planner: PlacementPlanner,
    name_policy: NamePolicy,
    generator: ThumbnailGenerator,
    fs: Arc<dyn Filesystem>,
}

impl UploadBehavior {
    /// Validates `config` and builds a behavior using the local disk and the
    /// `image`-backed codec.
    ///
    /// # Errors
    ///
    /// [`PlacementError::Configuration`] or [`PlacementError::InvalidProfile`]
    /// if the config is incomplete or a thumbnail profile has no positive side.
    pub fn new(config: PlacementConfig) -> PlacementResult<Self> {
        config.check()?;

        let name_policy = NamePolicy::from(config.name_policy);
        let generator = ThumbnailGenerator::new(
            Arc::new(ImageRsCodec),
            ResourceLimits::new(config.memory_limit),
        );
        let planner = PlacementPlanner::new(config)?;

        debug!(
            attribute = %planner.config().attribute,
            profiles = planner.config().thumbs.len(),
            "Upload behavior configured"
        );

        Ok(Self {
            planner,
            name_policy,
            generator,
            fs: Arc::new(LocalFilesystem),
        })
    }

    /// Replaces the configured naming policy with a custom generator.
    pub fn with_name_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(&StoredFile) -> String + Send + Sync + 'static,
    {
        self.name_policy = NamePolicy::Custom(Arc::new(generator));
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.generator = self.generator.with_codec(codec);
        self
    }

    pub fn with_filesystem(mut self, fs: Arc<dyn Filesystem>) -> Self {
        self.generator = self.generator.with_filesystem(fs.clone());
        self.fs = fs;
        self
    }

    pub fn config(&self) -> &PlacementConfig {
        self.planner.config()
    }

    pub fn planner(&self) -> &PlacementPlanner {
        &self.planner
    }

    /// The record field this behavior manages.
    pub fn attribute(&self) -> &str {
        &self.config().attribute
    }

    pub fn is_scenario_allowed(&self, scenario: Scenario) -> bool {
        self.config().scenarios.contains(&scenario)
    }

    /// Starts the hook sequence for one save of one record.
    pub fn begin_cycle(&self) -> SaveCycle<'_> {
        SaveCycle {
            behavior: self,
            state: CycleState::Idle,
            staged: None,
        }
    }

    /// Absolute path of the stored file. `old` reads the persisted filename
    /// rather than the staged one.
    pub fn upload_path<R: HostRecord + ?Sized>(
        &self,
        record: &R,
        attribute: &str,
        old: bool,
    ) -> Option<PathBuf> {
        self.planner.upload_path(record, attribute, old)
    }

    pub fn upload_url<R: HostRecord + ?Sized>(&self, record: &R, attribute: &str) -> Option<String> {
        self.planner.upload_url(record, attribute)
    }

    pub fn thumb_upload_path<R: HostRecord + ?Sized>(
        &self,
        record: &R,
        attribute: &str,
        profile: &str,
        old: bool,
    ) -> Option<PathBuf> {
        self.planner.thumb_upload_path(record, attribute, profile, old)
    }

    /// URL of a thumbnail, or of the placeholder's thumbnail when the record
    /// has none.
    ///
    /// With `create_thumbs_on_request`, missing thumbnails of the record's
    /// file are generated first.
    #[instrument(skip_all, fields(attribute = %attribute, profile = %profile))]
    pub async fn thumb_upload_url<R: HostRecord + ?Sized>(
        &self,
        record: &R,
        attribute: &str,
        profile: &str,
    ) -> PlacementResult<Option<String>> {
        if self.config().create_thumbs_on_request {
            let report = self.create_thumbs(record).await?;
            for (name, e) in &report.failed {
                warn!(profile = %name, error = %e, "Deferred thumbnail generation failed");
            }
        }

        if let Some(path) = self.thumb_upload_path(record, attribute, profile, false) {
            if self.fs.exists(&path).await {
                return Ok(self.planner.thumb_upload_url(record, attribute, profile));
            }
        }

        if self.config().placeholder.is_some() {
            return self.placeholder_url(profile).await;
        }

        Ok(None)
    }

    /// Generates every configured thumbnail of the record's stored file that
    /// doesn't exist yet.
    ///
    /// Returns an empty report when there is no stored file on disk.
    #[instrument(skip_all, fields(attribute = %self.attribute()))]
    pub async fn create_thumbs<R: HostRecord + ?Sized>(
        &self,
        record: &R,
    ) -> PlacementResult<ThumbnailReport> {
        let mut report = ThumbnailReport::default();
        let attribute = self.attribute();

        let Some(source) = self.upload_path(record, attribute, false) else {
            return Ok(report);
        };
        if !self.fs.exists(&source).await {
            debug!(source = %source.display(), "No stored file, skipping thumbnails");
            return Ok(report);
        }

        for profile in &self.config().thumbs {
            let Some(thumb_path) = self.thumb_upload_path(record, attribute, &profile.name, false)
            else {
                continue;
            };

            if let Some(directory) = thumb_path.parent() {
                if let Err(source) = self.fs.create_directory(directory, true).await {
                    warn!(profile = %profile.name, error = %source, "Cannot create thumbnail directory");
                    report.failed.push((
                        profile.name.clone(),
                        PlacementError::DirectoryUnwritable {
                            path: directory.to_path_buf(),
                            source,
                        },
                    ));
                    continue;
                }
            }

            match self.generator.generate(&source, &thumb_path, profile).await {
                Ok(ThumbnailOutcome::Generated { .. }) => report.generated.push(thumb_path),
                Ok(ThumbnailOutcome::Skipped) => report.skipped.push(thumb_path),
                Err(e) => {
                    warn!(profile = %profile.name, error = %e, "Thumbnail generation failed");
                    report.failed.push((profile.name.clone(), e));
                }
            }
        }

        if self.config().delete_original_file {
            self.fs.remove(&source).await?;
            debug!(source = %source.display(), "Original removed after thumbnail generation");
        }

        Ok(report)
    }

    /// Removes the record's files once the host deleted the record.
    ///
    /// Returns how many files were actually removed; a record without files is
    /// a successful no-op.
    #[instrument(skip_all, fields(attribute = %self.attribute()))]
    pub async fn after_delete<R: HostRecord + ?Sized>(&self, record: &R) -> PlacementResult<usize> {
        if !self.config().unlink_on_delete {
            return Ok(0);
        }

        let removed = self.delete_files(record, self.attribute(), false).await?;
        info!(removed, "Attachment files removed after delete");
        Ok(removed)
    }

    /// Removes the stored file and every thumbnail derived from it.
    async fn delete_files<R: HostRecord + ?Sized>(
        &self,
        record: &R,
        attribute: &str,
        old: bool,
    ) -> PlacementResult<usize> {
        let mut paths = Vec::new();
        paths.extend(self.upload_path(record, attribute, old));
        for profile in &self.config().thumbs {
            paths.extend(self.thumb_upload_path(record, attribute, &profile.name, old));
        }

        let mut removed = 0;
        let mut directories: Vec<&Path> = Vec::new();
        for path in &paths {
            if self.fs.remove(path).await? {
                removed += 1;
            }
            if let Some(directory) = path.parent() {
                if !directories.contains(&directory) {
                    directories.push(directory);
                }
            }
        }

        if self.config().delete_empty_dir {
            for directory in directories {
                self.fs.remove_dir_if_empty(directory).await?;
            }
        }

        Ok(removed)
    }

    async fn placeholder_url(&self, profile_name: &str) -> PlacementResult<Option<String>> {
        let Some(profile) = self.config().profile(profile_name) else {
            warn!(profile = %profile_name, "Unknown thumbnail profile for placeholder");
            return Ok(None);
        };
        let (Some(source), Some(thumb)) = (
            self.planner.placeholder_source(),
            self.planner.placeholder_thumb(profile_name),
        ) else {
            return Ok(None);
        };

        if !self.fs.exists(&thumb.absolute_path).await {
            self.generator
                .generate(&source, &thumb.absolute_path, profile)
                .await?;
        }

        Ok(Some(thumb.public_url))
    }
}

/// Where a [`SaveCycle`] is in its hook sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Validating,
    Saving,
    Uploaded,
    ThumbnailsReady,
}

#[derive(Debug)]
struct StagedUpload {
    file_name: String,
    file: StoredFile,
}

/// What `after_save` wrote.
#[derive(Debug)]
pub struct SaveOutcome {
    pub path: PathBuf,
    /// `None` when no thumbnails were due on save.
    pub thumbnails: Option<ThumbnailReport>,
}

/// Hook sequence of a single save. A staged upload lives here between
/// `before_validate` and `after_save`.
pub struct SaveCycle<'b> {
    behavior: &'b UploadBehavior,
    state: CycleState,
    staged: Option<StagedUpload>,
}

impl SaveCycle<'_> {
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Stored name of the staged upload, if any.
    pub fn staged_file_name(&self) -> Option<&str> {
        self.staged.as_ref().map(|staged| staged.file_name.as_str())
    }

    /// Stages `upload` when the record's scenario is allowed, and points the
    /// attribute at the name it will be stored under. No I/O happens here.
    ///
    /// Returns whether a file was staged.
    ///
    /// # Errors
    ///
    /// [`PlacementError::EmptyFileName`] when a custom generator returns an
    /// empty name. An empty sanitized name falls back to a generated one.
    #[instrument(skip_all, fields(scenario = %record.scenario()))]
    pub fn before_validate<R: HostRecord + ?Sized>(
        &mut self,
        record: &mut R,
        upload: Option<StoredFile>,
    ) -> PlacementResult<bool> {
        self.state = CycleState::Validating;
        let behavior = self.behavior;

        if !behavior.is_scenario_allowed(record.scenario()) {
            debug!("Scenario not allowed, upload ignored");
            return Ok(false);
        }
        let Some(file) = upload else {
            return Ok(false);
        };

        let file_name = match name_for(&file, &behavior.name_policy) {
            Ok(name) => name,
            Err(PlacementError::EmptyFileName)
                if matches!(behavior.name_policy, NamePolicy::Sanitize) =>
            {
                warn!(
                    original_name = %file.original_name(),
                    "Sanitized name is empty, generating one"
                );
                generate_file_name(file.extension())
            }
            Err(e) => return Err(e),
        };

        debug!(original_name = %file.original_name(), %file_name, "Upload staged");
        record.set_attribute(behavior.attribute(), Value::String(file_name.clone()));
        self.staged = Some(StagedUpload { file_name, file });
        Ok(true)
    }

    /// Runs right before the host writes the record.
    ///
    /// A replaced file (and its thumbnails) is deleted here, while the old
    /// filename is still the persisted one. A staged upload always counts as a
    /// change, even when it is stored under the same name as the old file. In
    /// an allowed scenario without a staged upload the attribute is reset to its
    /// persisted value, so clients cannot point it at arbitrary files.
    #[instrument(skip_all, fields(scenario = %record.scenario()))]
    pub async fn before_save<R: HostRecord + ?Sized>(&mut self, record: &mut R) -> PlacementResult<()> {
        self.state = CycleState::Saving;
        let behavior = self.behavior;
        let attribute = behavior.attribute();
        let unlink = !record.is_new_record() && behavior.config().unlink_on_save;

        if behavior.is_scenario_allowed(record.scenario()) {
            match &self.staged {
                Some(staged) => {
                    if unlink {
                        let removed = behavior.delete_files(&*record, attribute, true).await?;
                        debug!(removed, "Replaced attachment removed");
                    }
                    record.set_attribute(attribute, Value::String(staged.file_name.clone()));
                }
                None => record.reset_attribute(attribute),
            }
        } else if unlink && record.is_attribute_changed(attribute) {
            let removed = behavior.delete_files(&*record, attribute, true).await?;
            debug!(removed, "Replaced attachment removed");
        }

        Ok(())
    }

    /// Writes the staged upload once the host has stored the record, then
    /// generates thumbnails when due.
    ///
    /// Returns `None` when nothing was staged this cycle.
    ///
    /// # Errors
    ///
    /// [`PlacementError::DirectoryUnwritable`] when the target directory cannot
    /// be created; nothing is written in that case. Thumbnail failures don't
    /// fail the save, they are listed in the outcome's report.
    #[instrument(skip_all, fields(attribute = %self.behavior.attribute()))]
    pub async fn after_save<R: HostRecord + ?Sized>(
        &mut self,
        record: &R,
    ) -> PlacementResult<Option<SaveOutcome>> {
        let Some(staged) = self.staged.take() else {
            self.state = CycleState::Idle;
            return Ok(None);
        };
        let behavior = self.behavior;
        let config = behavior.config();

        let path = behavior
            .upload_path(record, behavior.attribute(), false)
            .ok_or(PlacementError::EmptyFileName)?;
        if has_placeholders(&path.to_string_lossy()) {
            warn!(path = %path.display(), "Upload path still has unresolved placeholders");
        }

        if let Some(directory) = path.parent() {
            behavior
                .fs
                .create_directory(directory, true)
                .await
                .map_err(|source| PlacementError::DirectoryUnwritable {
                    path: directory.to_path_buf(),
                    source,
                })?;
        }

        let size = staged.file.size_bytes();
        if let Err(e) = staged.file.save_to(&path, config.delete_temp_file).await {
            FileManager::cleanup_file(&path).await;
            return Err(e.into());
        }
        self.state = CycleState::Uploaded;
        info!(path = %path.display(), size, "Upload saved");

        let thumbnails = if config.is_image() && config.create_thumbs_on_save {
            let report = behavior.create_thumbs(record).await?;
            self.state = CycleState::ThumbnailsReady;
            info!(
                generated = report.generated.len(),
                skipped = report.skipped.len(),
                failed = report.failed.len(),
                "Thumbnails processed"
            );
            Some(report)
        } else {
            None
        };

        self.state = CycleState::Idle;
        Ok(Some(SaveOutcome { path, thumbnails }))
    }
}
