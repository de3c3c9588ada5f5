//! # Placement Services
//!
//! The attachment placement core. Each submodule owns one step of getting an
//! upload from the request onto disk:
//!
//! - **Template** (`template`) - `{field}` placeholders and `@alias` prefixes
//! - **Filename** (`filename`) - the name an upload is stored under
//! - **Planner** (`planner`) - absolute paths and public URLs of files and thumbnails
//! - **Thumbnail** (`thumbnail`) - resized derivatives behind the [`ImageCodec`] seam
//! - **Behavior** (`behavior`) - the save/delete lifecycle hooks tying it together

pub mod behavior;
pub mod filename;
pub mod planner;
pub mod template;
pub mod thumbnail;

pub use behavior::{CycleState, SaveCycle, SaveOutcome, UploadBehavior};
pub use filename::{NameGenerator, NamePolicy};
pub use planner::{PlacementPlanner, ResolvedPlacement};
pub use template::AliasMap;
pub use thumbnail::{
    ImageCodec, ImageRsCodec, RenderedImage, ResourceLimits, ThumbnailGenerator, ThumbnailOutcome,
    ThumbnailReport,
};
