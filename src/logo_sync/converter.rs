//! Image conversion to the single artifact profile (lossy WEBP)
//!
//! Runs synchronously; callers move it onto the blocking pool.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::config::ImageConfig;
use crate::errors::{ImageError, ImageResult};

/// Encoding parameters shared by every conversion of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionProfile {
    pub target_width: u32,
    pub quality: f32,
    pub method: i32,
}

impl ConversionProfile {
    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            target_width: config.target_width,
            quality: config.webp_quality,
            method: config.webp_method,
        }
    }
}

/// Encoded artifact plus the dimensions it was encoded at
#[derive(Debug, Clone)]
pub struct ConvertedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Height after scaling to `target_width`, truncated and never below one
pub fn local_resize_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = u64::from(height) * u64::from(target_width) / u64::from(width.max(1));
    scaled.clamp(1, u64::from(u32::MAX)) as u32
}

/// Decode `bytes`, optionally resize to the profile width, and encode as WEBP
pub fn convert_to_webp(
    bytes: &[u8],
    resize: bool,
    profile: &ConversionProfile,
) -> ImageResult<ConvertedImage> {
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidDimensions { width, height });
    }

    let image = if resize {
        let new_height = local_resize_height(width, height, profile.target_width);
        decoded.resize_exact(profile.target_width, new_height, FilterType::Lanczos3)
    } else {
        decoded
    };

    encode_webp(&image, profile)
}

fn encode_webp(image: &DynamicImage, profile: &ConversionProfile) -> ImageResult<ConvertedImage> {
    let (width, height) = image.dimensions();

    let mut config =
        webp::WebPConfig::new().map_err(|()| ImageError::encode("failed to create WebPConfig"))?;
    config.lossless = 0;
    config.quality = profile.quality;
    config.method = profile.method;

    let encoded = if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height)
            .encode_advanced(&config)
            .map_err(|e| ImageError::encode(format!("{e:?}")))?
            .to_vec()
    } else {
        let rgb = image.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height)
            .encode_advanced(&config)
            .map_err(|e| ImageError::encode(format!("{e:?}")))?
            .to_vec()
    };

    Ok(ConvertedImage {
        data: encoded,
        width,
        height,
    })
}
