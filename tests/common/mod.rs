#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::multipart;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tokio::net::TcpListener;
use upload_behavior::error::PlacementResult;
use upload_behavior::models::{AppState, FitMode, PlacementConfig, Scenario};
use upload_behavior::services::{ImageCodec, ImageRsCodec, RenderedImage, ResourceLimits, UploadBehavior};

pub fn init_tracing_once() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("upload_behavior=debug")
            .with_test_writer()
            .try_init();
    });
}

/// A temporary storage root, exposed to templates as `@webroot` and `@web`.
pub struct TestRoot {
    pub dir: TempDir,
}

impl TestRoot {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Plain file config storing under `{root}/upload/{id}`.
    pub fn config(&self, attribute: &str) -> PlacementConfig {
        PlacementConfig::new(attribute, "@webroot/upload/{id}", "@web/upload/{id}")
            .with_alias("@webroot", self.path().to_string_lossy())
            .with_alias("@web", "http://files.test")
    }
}

/// Encodes a `width`x`height` gradient as PNG bytes.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Png)
}

/// Encodes a `width`x`height` gradient as JPEG bytes.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Jpeg)
}

fn gradient(width: u32, height: u32) -> DynamicImage {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    DynamicImage::ImageRgb8(image)
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, format)
        .expect("Failed to encode test image");
    bytes.into_inner()
}

/// Writes a gradient image to `path`, creating parent directories.
pub fn write_image(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    gradient(width, height)
        .save(path)
        .expect("Failed to write test image");
}

pub fn image_size(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).expect("Failed to read image dimensions")
}

pub fn sha256(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

pub fn sha256_file(path: &Path) -> String {
    sha256(&std::fs::read(path).expect("Failed to read file"))
}

/// Codec wrapper counting how often images are actually decoded.
#[derive(Default)]
pub struct CountingCodec {
    inner: ImageRsCodec,
    pub decodes: AtomicUsize,
}

impl CountingCodec {
    pub fn decodes(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }
}

impl ImageCodec for CountingCodec {
    fn dimensions(&self, path: &Path, limits: &ResourceLimits) -> PlacementResult<(u32, u32)> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        self.inner.dimensions(path, limits)
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
        self.decodes.fetch_add(1, Ordering::SeqCst);
        self.inner
            .thumbnail(path, width, height, mode, background, limits)
    }
}

pub struct TestApp {
    pub address: String,
    pub root: TestRoot,
    pub state: Arc<AppState>,
}

/// Spawns the reference host storing into a fresh temporary root.
///
/// `configure` adjusts the default `file` attribute config.
///
/// Returned address format: `http://127.0.0.1:8492`
pub async fn spawn_app(configure: impl FnOnce(PlacementConfig) -> PlacementConfig) -> TestApp {
    init_tracing_once();
    let root = TestRoot::new();

    let config = PlacementConfig::new("file", "@webroot/records/{id}", "@web/records/{id}")
        .with_scenarios([Scenario::Insert, Scenario::Update])
        .with_alias("@webroot", root.path().to_string_lossy())
        .with_alias("@web", "/uploads");
    let behavior = UploadBehavior::new(configure(config)).expect("Invalid test config");
    let state = Arc::new(AppState::new(behavior));

    // Randomly choose an available port
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port at localhost");
    let port = listener.local_addr().unwrap().port();

    let router = upload_behavior::app_with_files(Arc::clone(&state), "/uploads", root.path());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let address = format!("http://127.0.0.1:{port}");

    // Wait for server to be ready
    let client = reqwest::Client::new();
    for _ in 0..10 {
        if client
            .get(format!("{address}/health-check"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    TestApp {
        address,
        root,
        state,
    }
}

/// Multipart form carrying `data` as the `file` part.
pub fn upload_form(file_name: &str, data: Vec<u8>, mime: &str) -> multipart::Form {
    multipart::Form::new().part(
        "file",
        multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .unwrap(),
    )
}
