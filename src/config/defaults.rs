// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! # Categories
//!
//! - **Avatar**: Upload ceiling, working-copy size and output surface
//! - **Background**: Same, for the page background
//! - **Crop**: Zoom bounds for interactive cropping
//! - **Storage**: Reopen cache sizing

// ==========================================================================
// Upload Defaults
// ==========================================================================

/// MIME types accepted at the validate stage.
pub const ACCEPTED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Hard upper bound for any configured upload ceiling (50 MiB).
pub const MAX_UPLOAD_CEILING_BYTES: usize = 50 * 1024 * 1024;

/// Lowest JPEG quality a config may request.
pub const MIN_QUALITY: u8 = 10;

/// Highest JPEG quality a config may request.
pub const MAX_QUALITY: u8 = 100;

/// Smallest working-copy edge a config may request.
pub const MIN_EDGE_PX: u32 = 64;

/// Largest working-copy edge a config may request.
pub const MAX_EDGE_PX: u32 = 8192;

// ==========================================================================
// Avatar Defaults
// ==========================================================================

pub const DEFAULT_AVATAR_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_AVATAR_MAX_EDGE_PX: u32 = 1024;
pub const DEFAULT_AVATAR_QUALITY: u8 = 85;
pub const DEFAULT_AVATAR_OUTPUT_WIDTH: u32 = 400;
pub const DEFAULT_AVATAR_OUTPUT_HEIGHT: u32 = 400;

// ==========================================================================
// Background Defaults
// ==========================================================================

pub const DEFAULT_BACKGROUND_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_BACKGROUND_MAX_EDGE_PX: u32 = 2560;
pub const DEFAULT_BACKGROUND_QUALITY: u8 = 82;
pub const DEFAULT_BACKGROUND_OUTPUT_WIDTH: u32 = 1080;
pub const DEFAULT_BACKGROUND_OUTPUT_HEIGHT: u32 = 1920;

// ==========================================================================
// Crop Defaults
// ==========================================================================

/// Multiplier applied to the minimum zoom so rounding never exposes an edge.
pub const DEFAULT_ZOOM_SAFETY_MARGIN: f64 = 1.0001;

/// Maximum zoom relative to the minimum.
pub const DEFAULT_MAX_ZOOM: f64 = 8.0;

pub const MIN_MAX_ZOOM: f64 = 1.0;
pub const MAX_MAX_ZOOM: f64 = 32.0;

// ==========================================================================
// Storage Defaults
// ==========================================================================

/// Decoded originals kept for re-cropping.
pub const DEFAULT_REOPEN_CACHE_ENTRIES: usize = 4;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    assert!(MIN_QUALITY > 0);
    assert!(MIN_QUALITY < MAX_QUALITY);
    assert!(DEFAULT_AVATAR_QUALITY >= MIN_QUALITY);
    assert!(DEFAULT_AVATAR_QUALITY <= MAX_QUALITY);
    assert!(DEFAULT_BACKGROUND_QUALITY >= MIN_QUALITY);
    assert!(DEFAULT_BACKGROUND_QUALITY <= MAX_QUALITY);

    assert!(DEFAULT_AVATAR_MAX_EDGE_PX >= MIN_EDGE_PX);
    assert!(DEFAULT_AVATAR_MAX_EDGE_PX <= MAX_EDGE_PX);
    assert!(DEFAULT_BACKGROUND_MAX_EDGE_PX >= MIN_EDGE_PX);
    assert!(DEFAULT_BACKGROUND_MAX_EDGE_PX <= MAX_EDGE_PX);

    assert!(DEFAULT_AVATAR_MAX_UPLOAD_BYTES <= MAX_UPLOAD_CEILING_BYTES);
    assert!(DEFAULT_BACKGROUND_MAX_UPLOAD_BYTES <= MAX_UPLOAD_CEILING_BYTES);

    // The output surface must fit inside the working copy.
    assert!(DEFAULT_AVATAR_OUTPUT_WIDTH <= DEFAULT_AVATAR_MAX_EDGE_PX);
    assert!(DEFAULT_AVATAR_OUTPUT_HEIGHT <= DEFAULT_AVATAR_MAX_EDGE_PX);
    assert!(DEFAULT_BACKGROUND_OUTPUT_WIDTH <= DEFAULT_BACKGROUND_MAX_EDGE_PX);
    assert!(DEFAULT_BACKGROUND_OUTPUT_HEIGHT <= DEFAULT_BACKGROUND_MAX_EDGE_PX);

    assert!(DEFAULT_ZOOM_SAFETY_MARGIN >= 1.0);
    assert!(DEFAULT_MAX_ZOOM >= MIN_MAX_ZOOM);
    assert!(DEFAULT_MAX_ZOOM <= MAX_MAX_ZOOM);

    assert!(DEFAULT_REOPEN_CACHE_ENTRIES > 0);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_defaults_are_valid() {
        assert_eq!(DEFAULT_AVATAR_MAX_UPLOAD_BYTES, 5 * 1024 * 1024);
        assert_eq!(DEFAULT_AVATAR_MAX_EDGE_PX, 1024);
        assert_eq!(DEFAULT_AVATAR_OUTPUT_WIDTH, DEFAULT_AVATAR_OUTPUT_HEIGHT);
    }

    #[test]
    fn background_is_portrait() {
        assert!(DEFAULT_BACKGROUND_OUTPUT_HEIGHT > DEFAULT_BACKGROUND_OUTPUT_WIDTH);
        assert!(DEFAULT_BACKGROUND_MAX_UPLOAD_BYTES > DEFAULT_AVATAR_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn accepted_mime_types_are_images() {
        assert!(ACCEPTED_MIME_TYPES.iter().all(|m| m.starts_with("image/")));
    }
}
