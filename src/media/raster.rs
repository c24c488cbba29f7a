// SPDX-License-Identifier: MPL-2.0
//! Rasterization of a crop onto the output surface, and final encoding.
//!
//! The crop rectangle is expressed in the space of the rotated image's
//! bounding box (see [`Rotation::bounds`]). Every output pixel is mapped back
//! through the crop and the inverse rotation to a source position and sampled
//! bilinearly. Positions that fall outside the source are transparent, so
//! rotated content is never clipped by the pre-rotation frame.

use crate::config::OutputFormat;
use crate::domain::geometry::{CropRect, Rotation, Size};
use crate::error::{Error, Result};
use image_rs::codecs::jpeg::JpegEncoder;
use image_rs::codecs::png::PngEncoder;
use image_rs::{ExtendedColorType, ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Parameters of one crop: where to look and how the source is turned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropParams {
    pub rect: CropRect,
    pub rotation: Rotation,
}

/// Draws `rect` of `source` rotated by `rotation` into a `width` × `height` surface.
///
/// # Errors
///
/// Returns [`Error::Raster`] for an empty source, an empty output surface or
/// a degenerate crop rectangle.
pub fn rasterize(
    source: &RgbaImage,
    rect: CropRect,
    rotation: Rotation,
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    if source.width() == 0 || source.height() == 0 {
        return Err(Error::Raster("source image is empty".to_string()));
    }
    if width == 0 || height == 0 {
        return Err(Error::Raster("output surface is empty".to_string()));
    }
    if !(rect.width > 0.0 && rect.height > 0.0) {
        return Err(Error::Raster(format!(
            "crop rectangle {}x{} is empty",
            rect.width, rect.height
        )));
    }

    let src = Size::from_pixels(source.width(), source.height());
    let bounds = rotation.bounds(src);
    let (sin, cos) = rotation.sin_cos();
    let step_x = rect.width / f64::from(width);
    let step_y = rect.height / f64::from(height);

    let output = RgbaImage::from_fn(width, height, |ox, oy| {
        // Output pixel center to bounding-box coordinates, relative to its center.
        let dx = rect.x + (f64::from(ox) + 0.5) * step_x - bounds.width / 2.0;
        let dy = rect.y + (f64::from(oy) + 0.5) * step_y - bounds.height / 2.0;
        // Inverse rotation back into the unrotated source frame.
        let ux = dx * cos + dy * sin + src.width / 2.0;
        let uy = -dx * sin + dy * cos + src.height / 2.0;
        sample(source, ux, uy)
    });
    Ok(output)
}

/// Bilinear sample at continuous source position `(ux, uy)`, where pixel
/// `(i, j)` covers `[i, i + 1) × [j, j + 1)`.
fn sample(source: &RgbaImage, ux: f64, uy: f64) -> Rgba<u8> {
    const EPS: f64 = 1e-9;
    let (w, h) = (f64::from(source.width()), f64::from(source.height()));
    if ux < -EPS || uy < -EPS || ux > w + EPS || uy > h + EPS {
        return TRANSPARENT;
    }

    let px = (ux - 0.5).clamp(0.0, w - 1.0);
    let py = (uy - 0.5).clamp(0.0, h - 1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x0, y0) = (px.floor() as u32, py.floor() as u32);
    let x1 = (x0 + 1).min(source.width() - 1);
    let y1 = (y0 + 1).min(source.height() - 1);
    let (fx, fy) = (px - f64::from(x0), py - f64::from(y0));

    let taps = [
        (source.get_pixel(x0, y0), (1.0 - fx) * (1.0 - fy)),
        (source.get_pixel(x1, y0), fx * (1.0 - fy)),
        (source.get_pixel(x0, y1), (1.0 - fx) * fy),
        (source.get_pixel(x1, y1), fx * fy),
    ];

    // Premultiplied accumulation keeps transparent texels from darkening edges.
    let mut rgb = [0.0_f64; 3];
    let mut alpha = 0.0_f64;
    for (pixel, weight) in taps {
        let a = f64::from(pixel[3]) * weight;
        alpha += a;
        for (acc, channel) in rgb.iter_mut().zip(pixel.0.iter()) {
            *acc += f64::from(*channel) * a;
        }
    }
    if alpha <= 0.0 {
        return TRANSPARENT;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let to_u8 = |value: f64| value.round().clamp(0.0, 255.0) as u8;
    Rgba([
        to_u8(rgb[0] / alpha),
        to_u8(rgb[1] / alpha),
        to_u8(rgb[2] / alpha),
        to_u8(alpha),
    ])
}

/// Composites `image` over an opaque white background.
#[must_use]
pub fn flatten(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        let alpha = u32::from(a);
        #[allow(clippy::cast_possible_truncation)]
        let over_white = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([over_white(r), over_white(g), over_white(b)])
    })
}

/// Whether every pixel is fully opaque.
#[must_use]
pub fn is_opaque(image: &RgbaImage) -> bool {
    image.pixels().all(|p| p[3] == u8::MAX)
}

/// Encodes `image` in `format`. `quality` applies to JPEG only; alpha is
/// flattened onto white for JPEG.
///
/// # Errors
///
/// Returns [`Error::Raster`] when the encoder fails or produces no bytes.
pub fn encode(image: &RgbaImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    match format {
        OutputFormat::Png => PngEncoder::new(&mut bytes)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| Error::Raster(format!("Failed to encode PNG: {e}")))?,
        OutputFormat::Jpeg => {
            let rgb = flatten(image);
            JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
                .encode_image(&rgb)
                .map_err(|e| Error::Raster(format!("Failed to encode JPEG: {e}")))?;
        }
    }
    if bytes.is_empty() {
        return Err(Error::Raster("encoder produced no bytes".to_string()));
    }
    Ok(bytes)
}
