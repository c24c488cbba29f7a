// SPDX-License-Identifier: MPL-2.0
//! Interactive crop state: zoom, pan, rotation and target aspect.
//!
//! Coordinates are in the space of the rotated image's bounding box. The
//! viewport is the output surface in pixels; `zoom` is output pixels per
//! bounding-box pixel, so the visible source region is `viewport / zoom`.
//!
//! Every operation leaves the session in a valid state: zoom within
//! `[min_zoom, max_zoom]` and the crop rectangle inside the bounds.

use super::raster::CropParams;
use crate::config::{CropConfig, ImageLimits};
use crate::domain::geometry::{
    crop_rect_for, min_zoom, recenter_for_aspect, AspectRatio, CropRect, Point, Rotation, Size,
};
use crate::error::{Error, Result};

/// A batch of crop edits, applied in field order.
///
/// `zoom` is relative to the minimum zoom: `1.0` fills the viewport with as
/// much of the image as fits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CropAdjustments {
    pub aspect: Option<AspectRatio>,
    pub rotation: Option<Rotation>,
    pub zoom: Option<f64>,
    /// Pan in bounding-box pixels.
    pub pan: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropSession {
    image: Size,
    viewport: Size,
    rotation: Rotation,
    zoom: f64,
    rect: CropRect,
    safety_margin: f64,
    max_zoom_factor: f64,
}

impl CropSession {
    /// Starts a session over an upright image of `image` size, at minimum
    /// zoom and centered.
    ///
    /// # Errors
    ///
    /// Returns a validation error when either size is empty.
    pub fn new(image: Size, viewport: Size, config: &CropConfig) -> Result<Self> {
        if image.is_empty() {
            return Err(Error::validation("crop", "image has no pixels"));
        }
        if viewport.is_empty() {
            return Err(Error::validation("crop", "viewport is empty"));
        }
        let mut session = Self {
            image,
            viewport,
            rotation: Rotation::ZERO,
            zoom: 1.0,
            rect: CropRect::new(0.0, 0.0, image.width, image.height),
            safety_margin: config.zoom_safety_margin,
            max_zoom_factor: config.max_zoom.max(1.0),
        };
        session.zoom = session.min_zoom();
        session.refresh(session.bounds().center());
        Ok(session)
    }

    /// A session whose viewport is the output surface of `limits`.
    ///
    /// # Errors
    ///
    /// See [`CropSession::new`].
    pub fn for_output(image: Size, limits: &ImageLimits, config: &CropConfig) -> Result<Self> {
        let viewport = Size::from_pixels(limits.output_width, limits.output_height);
        Self::new(image, viewport, config)
    }

    // ==========================================================================
    // Accessors
    // ==========================================================================

    /// Bounding box of the rotated image.
    #[must_use]
    pub fn bounds(&self) -> Size {
        self.rotation.bounds(self.image)
    }

    #[must_use]
    pub fn image_size(&self) -> Size {
        self.image
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Viewport rounded to whole output pixels.
    #[must_use]
    pub fn output_size(&self) -> (u32, u32) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let px = |v: f64| (v.round() as u32).max(1);
        (px(self.viewport.width), px(self.viewport.height))
    }

    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Smallest zoom at which the viewport shows no area outside the bounds.
    #[must_use]
    pub fn min_zoom(&self) -> f64 {
        min_zoom(self.bounds(), self.viewport, self.safety_margin)
    }

    #[must_use]
    pub fn max_zoom(&self) -> f64 {
        self.min_zoom() * self.max_zoom_factor
    }

    #[must_use]
    pub fn rect(&self) -> CropRect {
        self.rect
    }

    #[must_use]
    pub fn params(&self) -> CropParams {
        CropParams {
            rect: self.rect,
            rotation: self.rotation,
        }
    }

    // ==========================================================================
    // Edits
    // ==========================================================================

    /// Sets the zoom, clamped to `[min_zoom, max_zoom]`.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = if zoom.is_finite() {
            zoom.clamp(self.min_zoom(), self.max_zoom())
        } else {
            self.min_zoom()
        };
        self.refresh(self.rect.center());
    }

    /// Multiplies the zoom by `factor`.
    pub fn zoom_by(&mut self, factor: f64) {
        self.set_zoom(self.zoom * factor);
    }

    /// Moves the crop by `(dx, dy)` bounding-box pixels, stopping at the edges.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let center = self.rect.center();
        self.center_on(Point::new(center.x + dx, center.y + dy));
    }

    pub fn center_on(&mut self, center: Point) {
        if center.x.is_finite() && center.y.is_finite() {
            self.refresh(center);
        }
    }

    /// Sets the absolute rotation. The crop keeps its position relative to
    /// the image center and the zoom is raised if the new bounds require it.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        let old = self.bounds();
        self.rotation = rotation;
        let new = self.bounds();
        let center = self.rect.center();
        let shifted = Point::new(
            center.x + (new.width - old.width) / 2.0,
            center.y + (new.height - old.height) / 2.0,
        );
        self.zoom = self.zoom.clamp(self.min_zoom(), self.max_zoom());
        self.refresh(shifted);
    }

    pub fn rotate_by(&mut self, degrees: f64) {
        self.set_rotation(Rotation::new(self.rotation.degrees() + degrees));
    }

    /// Changes the target aspect ratio.
    ///
    /// The viewport keeps its longer edge. The new crop is centered on the
    /// previous crop's center and clamped to the bounds.
    pub fn set_aspect(&mut self, aspect: AspectRatio) {
        let long_edge = self.viewport.width.max(self.viewport.height);
        self.viewport = aspect.viewport(long_edge);
        let bounds = self.bounds();
        let rect = recenter_for_aspect(self.rect, aspect, bounds);
        self.zoom = (self.viewport.width / rect.width).clamp(self.min_zoom(), self.max_zoom());
        self.refresh(rect.center());
    }

    /// Applies a batch of edits: aspect, rotation, zoom, then pan.
    pub fn apply(&mut self, adjustments: &CropAdjustments) {
        if let Some(aspect) = adjustments.aspect {
            self.set_aspect(aspect);
        }
        if let Some(rotation) = adjustments.rotation {
            self.set_rotation(rotation);
        }
        if let Some(zoom) = adjustments.zoom {
            self.set_zoom(self.min_zoom() * zoom);
        }
        if let Some((dx, dy)) = adjustments.pan {
            self.pan_by(dx, dy);
        }
    }

    fn refresh(&mut self, center: Point) {
        self.rect = crop_rect_for(self.bounds(), self.viewport, self.zoom, center);
    }
}
