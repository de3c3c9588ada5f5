//! # Thumbnail Generation
//!
//! Produces resized derivatives of stored images. Generation is idempotent: a
//! destination that already exists is never rendered again, so regenerating a
//! thumbnail means deleting it first.
//!
//! Decoding and encoding go through the [`ImageCodec`] trait. [`ImageRsCodec`]
//! is the default implementation, backed by the `image` crate. Every codec call
//! receives the [`ResourceLimits`] of that call; nothing is configured globally.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{
    DynamicImage, GenericImageView, ImageFormat, ImageReader, Limits, Rgba, RgbaImage,
    codecs::jpeg::JpegEncoder,
    imageops::{self, FilterType},
};
use tracing::{debug, error, info, instrument, trace};

use crate::error::{PlacementError, PlacementResult};
use crate::models::{FitMode, ThumbnailProfile};
use crate::utils::constant::DEFAULT_MEMORY_LIMIT;
use crate::utils::file::{Filesystem, LocalFilesystem};

/// Memory ceiling for one decode/encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Upper bound on bytes allocated for pixel buffers, `None` for unbounded.
    pub max_alloc: Option<u64>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_alloc: Some(DEFAULT_MEMORY_LIMIT),
        }
    }
}

impl ResourceLimits {
    pub fn new(max_alloc: Option<u64>) -> Self {
        Self { max_alloc }
    }

    pub fn unlimited() -> Self {
        Self { max_alloc: None }
    }

    /// Fresh `image` limits for a single call.
    pub fn to_image_limits(&self) -> Limits {
        let mut limits = Limits::no_limits();
        limits.max_alloc = self.max_alloc;
        limits
    }
}

/// A decoded, resized image ready to be written.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    image: DynamicImage,
}

impl RenderedImage {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encodes to `path`, picking the format from its extension. `quality`
    /// applies to JPEG output. A partially written file is removed on failure.
    pub fn save(&self, path: &Path, quality: u8) -> PlacementResult<()> {
        let format =
            ImageFormat::from_path(path).map_err(|e| PlacementError::from_image(path, e))?;

        let result = self.encode(path, format, quality);
        if result.is_err() {
            match std::fs::remove_file(path) {
                Ok(()) => trace!(file_path = %path.display(), "Partial thumbnail removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    error!(file_path = %path.display(), error = %e, "Failed to clean up file");
                }
            }
        }
        result
    }

    fn encode(&self, path: &Path, format: ImageFormat, quality: u8) -> PlacementResult<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);

        let encoded = match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
                DynamicImage::ImageRgb8(self.image.to_rgb8()).write_with_encoder(encoder)
            }
            _ => self.image.write_to(&mut writer, format),
        };
        encoded.map_err(|e| PlacementError::from_image(path, e))?;

        writer.flush()?;
        Ok(())
    }
}

/// The image operations thumbnail generation needs.
pub trait ImageCodec: Send + Sync {
    /// True pixel dimensions of the image at `path`.
    fn dimensions(&self, path: &Path, limits: &ResourceLimits) -> PlacementResult<(u32, u32)>;

    /// Renders a `width`x`height` thumbnail of the image at `path`.
    ///
    /// `mode` is interpreted by the codec alone.
    fn thumbnail(
        &self,
        path: &Path,
        width: u32,
        height: u32,
        mode: FitMode,
        background: [u8; 4],
        limits: &ResourceLimits,
    ) -> PlacementResult<RenderedImage>;
}

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageRsCodec;

impl ImageRsCodec {
    fn reader(
        path: &Path,
        limits: &ResourceLimits,
    ) -> PlacementResult<ImageReader<std::io::BufReader<std::fs::File>>> {
        let mut reader = ImageReader::open(path)?.with_guessed_format()?;
        reader.limits(limits.to_image_limits());
        Ok(reader)
    }
}

impl ImageCodec for ImageRsCodec {
    fn dimensions(&self, path: &Path, limits: &ResourceLimits) -> PlacementResult<(u32, u32)> {
        Self::reader(path, limits)?
            .into_dimensions()
            .map_err(|e| PlacementError::from_image(path, e))
    }

    fn thumbnail(
        &self,
        path: &Path,
        width: u32,
        height: u32,
        mode: FitMode,
        background: [u8; 4],
        limits: &ResourceLimits,
    ) -> PlacementResult<RenderedImage> {
        let image = Self::reader(path, limits)?
            .decode()
            .map_err(|e| PlacementError::from_image(path, e))?;

        // The output buffer counts against the same ceiling as the decode.
        let mut output_limits = limits.to_image_limits();
        output_limits
            .reserve(u64::from(width) * u64::from(height) * 4)
            .map_err(|e| PlacementError::from_image(path, e))?;

        let (source_width, source_height) = image.dimensions();
        trace!(source_width, source_height, width, height, ?mode, "Rendering thumbnail");

        let rendered = match mode {
            FitMode::Outbound => image.resize_to_fill(width, height, FilterType::Lanczos3),
            FitMode::Inset => {
                let fitted = if source_width <= width && source_height <= height {
                    image
                } else {
                    image.resize(width, height, FilterType::Lanczos3)
                };

                let mut canvas = RgbaImage::from_pixel(width, height, Rgba(background));
                let x = width.saturating_sub(fitted.width()) / 2;
                let y = height.saturating_sub(fitted.height()) / 2;
                imageops::overlay(&mut canvas, &fitted.to_rgba8(), i64::from(x), i64::from(y));
                DynamicImage::ImageRgba8(canvas)
            }
        };

        Ok(RenderedImage::new(rendered))
    }
}

/// Result of one generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    Generated { width: u32, height: u32 },
    /// The destination already existed; nothing was decoded.
    Skipped,
}

/// Box size for a profile given the source's true dimensions.
///
/// With only one side configured, the other follows the source aspect ratio,
/// rounded and never below 1.
pub fn target_dimensions(
    width: Option<u32>,
    height: Option<u32>,
    (source_width, source_height): (u32, u32),
) -> (u32, u32) {
    let ratio = f64::from(source_width.max(1)) / f64::from(source_height.max(1));
    let scaled = |value: f64| (value.round() as u32).max(1);

    match (positive(width), positive(height)) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, scaled(f64::from(w) / ratio)),
        (None, Some(h)) => (scaled(f64::from(h) * ratio), h),
        (None, None) => (source_width.max(1), source_height.max(1)),
    }
}

fn positive(value: Option<u32>) -> Option<u32> {
    value.filter(|v| *v > 0)
}

#[derive(Clone)]
pub struct ThumbnailGenerator {
    codec: Arc<dyn ImageCodec>,
    fs: Arc<dyn Filesystem>,
    limits: ResourceLimits,
}

impl Default for ThumbnailGenerator {
    fn default() -> Self {
        Self::new(Arc::new(ImageRsCodec), ResourceLimits::default())
    }
}

impl ThumbnailGenerator {
    pub fn new(codec: Arc<dyn ImageCodec>, limits: ResourceLimits) -> Self {
        Self {
            codec,
            fs: Arc::new(LocalFilesystem),
            limits,
        }
    }

    /// Routes the source, destination and directory checks through `fs`.
    pub fn with_filesystem(mut self, fs: Arc<dyn Filesystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Same filesystem and limits, different codec.
    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn limits(&self) -> ResourceLimits {
        self.limits
    }

    /// Renders `profile` of `source` to `destination` under the generator's
    /// own limits.
    pub async fn generate(
        &self,
        source: &Path,
        destination: &Path,
        profile: &ThumbnailProfile,
    ) -> PlacementResult<ThumbnailOutcome> {
        self.generate_with_limits(source, destination, profile, &self.limits)
            .await
    }

    /// Renders `profile` of `source` to `destination` under `limits`.
    ///
    /// # Errors
    ///
    /// - [`PlacementError::DestinationUnwritable`] if the destination directory is missing
    /// - [`PlacementError::MissingSource`] if there is no source file
    /// - [`PlacementError::ResourceExhausted`] if the image doesn't fit in `limits`
    #[instrument(skip_all, fields(profile = %profile.name, destination = %destination.display()))]
    pub async fn generate_with_limits(
        &self,
        source: &Path,
        destination: &Path,
        profile: &ThumbnailProfile,
        limits: &ResourceLimits,
    ) -> PlacementResult<ThumbnailOutcome> {
        if self.fs.exists(destination).await {
            debug!("Thumbnail already exists, skipping");
            return Ok(ThumbnailOutcome::Skipped);
        }

        if !self.fs.exists(source).await {
            return Err(PlacementError::MissingSource {
                path: source.to_path_buf(),
            });
        }

        if let Some(directory) = destination.parent() {
            if !directory.as_os_str().is_empty() && !self.fs.is_directory(directory).await {
                return Err(PlacementError::DestinationUnwritable {
                    path: destination.to_path_buf(),
                });
            }
        }

        let (width, height) = match (positive(profile.width), positive(profile.height)) {
            (Some(w), Some(h)) => (w, h),
            _ => target_dimensions(
                profile.width,
                profile.height,
                self.codec.dimensions(source, limits)?,
            ),
        };

        let rendered = self.codec.thumbnail(
            source,
            width,
            height,
            profile.mode,
            profile.background(),
            limits,
        )?;
        rendered.save(destination, profile.quality)?;

        info!(width, height, "Thumbnail created successfully");
        Ok(ThumbnailOutcome::Generated { width, height })
    }
}

/// Per-profile results of one thumbnail pass. Failures of one profile never
/// stop the others, and already written thumbnails are kept.
#[derive(Debug, Default)]
pub struct ThumbnailReport {
    pub generated: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(String, PlacementError)>,
}

impl ThumbnailReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
