//! # Thumbnail Profiles
//!
//! A profile names one derivative of an uploaded image: its box size, encoder
//! quality, fit mode and canvas colour.

use serde::{Deserialize, Serialize};

use crate::error::{PlacementError, PlacementResult};
use crate::utils::constant::{DEFAULT_BACKGROUND, DEFAULT_PROFILE, DEFAULT_THUMB_QUALITY};

/// How the source is fitted into the profile's box.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Fit inside the box keeping the aspect ratio, padded to the box size.
    #[default]
    Inset,
    /// Fill the box keeping the aspect ratio, cropping the overflow.
    Outbound,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ThumbnailProfile {
    pub name: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub mode: FitMode,
    /// Hex colour, `FFF`, `FFFFFF` or `FFFFFFAA`.
    #[serde(default)]
    pub bg_color: Option<String>,
}

fn default_quality() -> u8 {
    DEFAULT_THUMB_QUALITY
}

impl ThumbnailProfile {
    /// Creates an inset profile with default quality.
    pub fn new(name: impl Into<String>, width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            quality: DEFAULT_THUMB_QUALITY,
            mode: FitMode::Inset,
            bg_color: None,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_mode(mut self, mode: FitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_bg_color(mut self, color: impl Into<String>) -> Self {
        self.bg_color = Some(color.into());
        self
    }

    /// The 200x200, quality 90 profile used when an image behavior is set up
    /// without naming its own.
    pub fn default_thumb() -> Self {
        Self::new(DEFAULT_PROFILE, Some(200), Some(200)).with_quality(90)
    }

    /// Checks the configured sizes: at least one side must be positive.
    pub fn validate(&self) -> PlacementResult<()> {
        let width = self.width.unwrap_or(0);
        let height = self.height.unwrap_or(0);
        if width < 1 && height < 1 {
            return Err(PlacementError::InvalidProfile {
                name: self.name.clone(),
                width,
                height,
            });
        }
        if !(1..=100).contains(&self.quality) {
            return Err(PlacementError::Configuration(format!(
                "quality of thumbnail profile `{}` must be within 1..=100, got {}",
                self.name, self.quality
            )));
        }
        if let Some(color) = &self.bg_color {
            parse_hex_color(color).ok_or_else(|| {
                PlacementError::Configuration(format!(
                    "invalid bg_color `{color}` for thumbnail profile `{}`",
                    self.name
                ))
            })?;
        }
        Ok(())
    }

    /// Canvas colour as RGBA, falling back to transparent white.
    pub fn background(&self) -> [u8; 4] {
        self.bg_color
            .as_deref()
            .and_then(parse_hex_color)
            .unwrap_or(DEFAULT_BACKGROUND)
    }
}

/// Parses `RGB`, `RRGGBB` or `RRGGBBAA`, with or without a leading `#`.
/// Colours without an alpha component are opaque.
pub fn parse_hex_color(raw: &str) -> Option<[u8; 4]> {
    let hex = raw.trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgba = [255u8; 4];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgba[i] = v * 16 + v;
            }
            Some(rgba)
        }
        6 => Some([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        ]),
        8 => Some([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        ]),
        _ => None,
    }
}
