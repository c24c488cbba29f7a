// SPDX-License-Identifier: MPL-2.0
//! Crop geometry: rotation bounds, zoom limits and crop rectangles.
//!
//! All functions are pure and independent of any drawing surface. Crop
//! rectangles are expressed in the pixel space of the rotated source, i.e.
//! inside the axis-aligned bounding box returned by [`Rotation::bounds`].
//! With no rotation that space is the source image itself.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Crop rectangle in rotated-source pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle of `size` centered on `center`.
    #[must_use]
    pub fn centered(center: Point, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether the rectangle lies entirely inside `bounds` (with float tolerance).
    #[must_use]
    pub fn fits_within(&self, bounds: Size) -> bool {
        const EPS: f64 = 1e-6;
        self.x >= -EPS
            && self.y >= -EPS
            && self.x + self.width <= bounds.width + EPS
            && self.y + self.height <= bounds.height + EPS
    }

    /// Shrinks the rectangle to fit `bounds`, then shifts it inside.
    ///
    /// Shrinking preserves the aspect ratio and the center point.
    #[must_use]
    pub fn clamp_to(self, bounds: Size) -> Self {
        let mut rect = self;
        let scale = (bounds.width / rect.width)
            .min(bounds.height / rect.height)
            .min(1.0);
        if scale < 1.0 {
            rect = Self::centered(
                rect.center(),
                Size::new(rect.width * scale, rect.height * scale),
            );
        }
        rect.x = rect.x.clamp(0.0, (bounds.width - rect.width).max(0.0));
        rect.y = rect.y.clamp(0.0, (bounds.height - rect.height).max(0.0));
        rect
    }
}

/// A rotation angle in degrees, normalized to `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation(f64);

impl Rotation {
    pub const ZERO: Self = Self(0.0);

    /// Creates a rotation, wrapping any angle into `[0, 360)`.
    #[must_use]
    pub fn new(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return Self::ZERO;
        }
        let wrapped = degrees.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
        Self(if wrapped >= 360.0 { 0.0 } else { wrapped })
    }

    #[must_use]
    pub fn degrees(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn radians(self) -> f64 {
        self.0.to_radians()
    }

    #[must_use]
    pub fn is_rotated(self) -> bool {
        self.0 != 0.0
    }

    /// `(sin, cos)` with values near 0 and ±1 snapped, so right angles are exact.
    #[must_use]
    pub fn sin_cos(self) -> (f64, f64) {
        let (sin, cos) = self.radians().sin_cos();
        (snap(sin), snap(cos))
    }

    /// Axis-aligned bounding box of an image of `size` rotated by this angle.
    ///
    /// `w' = w·|cos r| + h·|sin r|`, `h' = w·|sin r| + h·|cos r|`.
    #[must_use]
    pub fn bounds(self, size: Size) -> Size {
        let (sin, cos) = self.sin_cos();
        let (sin, cos) = (sin.abs(), cos.abs());
        Size::new(
            size.width * cos + size.height * sin,
            size.width * sin + size.height * cos,
        )
    }
}

/// Removes floating-point noise near 0 and ±1 so right angles stay exact.
fn snap(value: f64) -> f64 {
    const EPS: f64 = 1e-12;
    if value.abs() < EPS {
        0.0
    } else if (value.abs() - 1.0).abs() < EPS {
        value.signum()
    } else {
        value
    }
}

/// Target aspect ratio of the crop viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRatio {
    width: f64,
    height: f64,
}

impl AspectRatio {
    pub const SQUARE: Self = Self {
        width: 1.0,
        height: 1.0,
    };
    pub const PORTRAIT_9_16: Self = Self {
        width: 9.0,
        height: 16.0,
    };
    pub const LANDSCAPE_16_9: Self = Self {
        width: 16.0,
        height: 9.0,
    };

    /// # Errors
    ///
    /// Returns [`Error::Validation`] when either side is not positive.
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
            Ok(Self { width, height })
        } else {
            Err(Error::validation("aspect", "aspect sides must be positive"))
        }
    }

    /// Parses `w:h` or `w/h`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for malformed input.
    pub fn parse(text: &str) -> Result<Self> {
        let (w, h) = text
            .split_once(':')
            .or_else(|| text.split_once('/'))
            .ok_or_else(|| Error::validation("aspect", format!("'{text}' is not w:h")))?;
        let parse = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| Error::validation("aspect", format!("'{text}' is not w:h")))
        };
        Self::new(parse(w)?, parse(h)?)
    }

    /// Width divided by height.
    #[must_use]
    pub fn value(self) -> f64 {
        self.width / self.height
    }

    /// A viewport of this aspect whose longer side is `long_edge`.
    #[must_use]
    pub fn viewport(self, long_edge: f64) -> Size {
        let ratio = self.value();
        if ratio >= 1.0 {
            Size::new(long_edge, long_edge / ratio)
        } else {
            Size::new(long_edge * ratio, long_edge)
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// Bounding box of `size` rotated by `rotation`. See [`Rotation::bounds`].
#[must_use]
pub fn rotated_bounds(size: Size, rotation: Rotation) -> Size {
    rotation.bounds(size)
}

/// Smallest zoom at which `viewport` is fully covered by `image`.
///
/// `max(vw / w, vh / h)` multiplied by `safety_margin` (≥ 1) so rounding
/// never exposes a sliver beyond the image edge.
#[must_use]
pub fn min_zoom(image: Size, viewport: Size, safety_margin: f64) -> f64 {
    if image.is_empty() || viewport.is_empty() {
        return 1.0;
    }
    (viewport.width / image.width).max(viewport.height / image.height) * safety_margin.max(1.0)
}

/// The source region shown by `viewport` at `zoom`, centered on `center`
/// and kept inside `bounds`.
#[must_use]
pub fn crop_rect_for(bounds: Size, viewport: Size, zoom: f64, center: Point) -> CropRect {
    let visible = Size::new(viewport.width / zoom, viewport.height / zoom);
    CropRect::centered(center, visible).clamp_to(bounds)
}

/// Re-derives a crop rectangle for a new aspect ratio.
///
/// The result keeps the previous rectangle's area where the bounds allow,
/// is centered on the previous center and lies inside `bounds`.
#[must_use]
pub fn recenter_for_aspect(previous: CropRect, aspect: AspectRatio, bounds: Size) -> CropRect {
    let area = (previous.width * previous.height).max(1.0);
    let width = (area * aspect.value()).sqrt();
    let height = width / aspect.value();
    CropRect::centered(previous.center(), Size::new(width, height)).clamp_to(bounds)
}
