// SPDX-License-Identifier: MPL-2.0
//! Whole-image transforms: EXIF orientation, quarter turns, flips and
//! downscaling.

use image_rs::{imageops::FilterType, DynamicImage};
use std::io::Cursor;

// ==========================================================================
// Orientation Value Object
// ==========================================================================

/// EXIF orientation tag, guaranteed to be within `1..=8`.
///
/// `1` is upright. The other values describe how the stored pixels must be
/// turned or mirrored to appear the way the camera saw them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation(u8);

impl Orientation {
    pub const UPRIGHT: Self = Self(1);

    /// Creates an orientation, treating out-of-range tags as upright.
    #[must_use]
    pub fn new(tag: u32) -> Self {
        match u8::try_from(tag) {
            Ok(value @ 1..=8) => Self(value),
            _ => Self::UPRIGHT,
        }
    }

    /// Reads the orientation tag from an encoded image. Anything unreadable is upright.
    #[must_use]
    pub fn read(bytes: &[u8]) -> Self {
        let exif = exif::Reader::new().read_from_container(&mut Cursor::new(bytes));
        exif.ok()
            .and_then(|exif| {
                exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                    .and_then(|field| field.value.get_uint(0))
            })
            .map_or(Self::UPRIGHT, Self::new)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_upright(self) -> bool {
        self.0 <= 1
    }
}

// ==========================================================================
// Image Transformation Functions
// ==========================================================================

/// Rotate an image 90 degrees counter-clockwise (left).
pub fn rotate_left(image: &DynamicImage) -> DynamicImage {
    image.rotate270()
}

/// Rotate an image 90 degrees clockwise (right).
pub fn rotate_right(image: &DynamicImage) -> DynamicImage {
    image.rotate90()
}

/// Flip an image horizontally (mirror left-to-right).
pub fn flip_horizontal(image: &DynamicImage) -> DynamicImage {
    image.fliph()
}

/// Turns stored pixels upright according to `orientation`.
#[must_use]
pub fn apply_orientation(image: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation.value() {
        2 => flip_horizontal(&image),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => flip_horizontal(&rotate_right(&image)),
        6 => rotate_right(&image),
        7 => flip_horizontal(&rotate_left(&image)),
        8 => rotate_left(&image),
        _ => image,
    }
}

/// Dimensions after shrinking `(width, height)` so the longer edge is at
/// most `max_edge`. Never enlarges; both sides stay at least 1 pixel.
#[must_use]
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_edge || longest == 0 {
        return (width, height);
    }
    let factor = f64::from(max_edge) / f64::from(longest);
    let scale = |side: u32| ((f64::from(side) * factor).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Downscales `image` so its longer edge is at most `max_edge`.
#[must_use]
pub fn downscale_to_fit(image: DynamicImage, max_edge: u32) -> DynamicImage {
    let (width, height) = fit_within(image.width(), image.height(), max_edge);
    if (width, height) == (image.width(), image.height()) {
        return image;
    }
    image.resize_exact(width, height, FilterType::Lanczos3)
}
