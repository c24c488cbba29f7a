// SPDX-License-Identifier: MPL-2.0
//! Compression: decode, turn upright, downscale and re-encode.
//!
//! The re-encoded artifact, decoded again, is the working copy used as the
//! interactive crop source, so the slot's quality setting shows in the crop.
//! The bytes handed in are not modified; the caller keeps them as the original.

use super::raster::{encode, is_opaque};
use super::transform::{apply_orientation, downscale_to_fit, Orientation};
use super::validate::ValidatedUpload;
use crate::config::{ImageLimits, OutputFormat};
use crate::error::{Error, Result};
use image_rs::{ImageFormat, RgbaImage};

/// The downscaled working copy of an upload.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    /// Pixels of `bytes`, decoded: the crop source.
    pub image: RgbaImage,
    /// The working copy re-encoded at the slot's quality.
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    /// Orientation tag found in the upload.
    pub orientation: Orientation,
}

impl CompressedImage {
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.format.mime_type()
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Decodes `bytes`, applies EXIF orientation and downscales so the longer
/// edge is at most `limits.max_edge_px`.
///
/// # Errors
///
/// Returns [`Error::Decode`] when the bytes cannot be decoded or decode to an
/// empty image.
pub fn decode_working_image(
    bytes: &[u8],
    format: Option<ImageFormat>,
    limits: &ImageLimits,
) -> Result<(RgbaImage, Orientation)> {
    let decoded = match format {
        Some(format) => image_rs::load_from_memory_with_format(bytes, format),
        None => image_rs::load_from_memory(bytes),
    }
    .map_err(|e| Error::Decode(e.to_string()))?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(Error::Decode("image has no pixels".to_string()));
    }

    let orientation = Orientation::read(bytes);
    let upright = apply_orientation(decoded, orientation);
    let working = downscale_to_fit(upright, limits.max_edge_px);
    Ok((working.to_rgba8(), orientation))
}

/// Runs the compress stage on a validated upload.
///
/// Opaque images are re-encoded as JPEG at `limits.quality`; images with
/// transparency are kept lossless as PNG.
///
/// # Errors
///
/// Returns [`Error::Decode`] or [`Error::Raster`] from the failing step.
pub fn compress(upload: &ValidatedUpload, limits: &ImageLimits) -> Result<CompressedImage> {
    let (upright, orientation) = decode_working_image(&upload.bytes, Some(upload.format), limits)?;
    let format = if is_opaque(&upright) {
        OutputFormat::Jpeg
    } else {
        OutputFormat::Png
    };
    let bytes = encode(&upright, format, limits.quality)?;
    let image = image_rs::load_from_memory_with_format(&bytes, format.image_format())
        .map_err(|e| Error::Decode(format!("re-encoded working copy: {e}")))?
        .to_rgba8();

    tracing::debug!(
        slot = %upload.slot,
        input_bytes = upload.bytes.len(),
        output_bytes = bytes.len(),
        width = image.width(),
        height = image.height(),
        orientation = orientation.value(),
        "upload compressed"
    );
    Ok(CompressedImage {
        image,
        bytes,
        format,
        orientation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::AssetSlot;
    use crate::media::validate::validate;
    use image_rs::{DynamicImage, Rgba};
    use std::io::Cursor;

    fn encoded(image: RgbaImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        let dynamic = DynamicImage::ImageRgba8(image);
        if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgb8(dynamic.to_rgb8())
                .write_to(&mut out, format)
                .unwrap();
        } else {
            dynamic.write_to(&mut out, format).unwrap();
        }
        out.into_inner()
    }

    fn upload(bytes: Vec<u8>, mime: &str) -> ValidatedUpload {
        validate(bytes, mime, AssetSlot::Avatar, &ImageLimits::avatar()).unwrap()
    }

    #[test]
    fn large_images_are_downscaled_to_max_edge() {
        let bytes = encoded(
            RgbaImage::from_pixel(1100, 550, Rgba([200, 100, 50, 255])),
            ImageFormat::Png,
        );
        let compressed = compress(&upload(bytes, "image/png"), &ImageLimits::avatar()).unwrap();
        assert_eq!(compressed.dimensions(), (1024, 512));
    }

    #[test]
    fn small_images_keep_their_size() {
        let bytes = encoded(
            RgbaImage::from_pixel(300, 200, Rgba([200, 100, 50, 255])),
            ImageFormat::Png,
        );
        let compressed = compress(&upload(bytes, "image/png"), &ImageLimits::avatar()).unwrap();
        assert_eq!(compressed.dimensions(), (300, 200));
    }

    #[test]
    fn opaque_images_become_jpeg() {
        let bytes = encoded(
            RgbaImage::from_pixel(64, 64, Rgba([10, 20, 30, 255])),
            ImageFormat::Png,
        );
        let compressed = compress(&upload(bytes, "image/png"), &ImageLimits::avatar()).unwrap();
        assert_eq!(compressed.format, OutputFormat::Jpeg);
        assert_eq!(compressed.content_type(), "image/jpeg");
        assert_eq!(&compressed.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn transparent_images_stay_png() {
        let bytes = encoded(RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 0])), ImageFormat::Png);
        let compressed = compress(&upload(bytes, "image/png"), &ImageLimits::avatar()).unwrap();
        assert_eq!(compressed.format, OutputFormat::Png);
    }

    #[test]
    fn working_copy_is_the_reencoded_artifact() {
        let bytes = encoded(
            RgbaImage::from_fn(64, 64, |x, y| Rgba([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8, 255])),
            ImageFormat::Png,
        );
        let compressed = compress(&upload(bytes.clone(), "image/png"), &ImageLimits::avatar()).unwrap();
        let decoded = image_rs::load_from_memory(&compressed.bytes).unwrap().to_rgba8();
        assert_eq!(compressed.image, decoded);

        let low = ImageLimits {
            quality: 10,
            ..ImageLimits::avatar()
        };
        let coarse = compress(&upload(bytes, "image/png"), &low).unwrap();
        assert_ne!(coarse.image, compressed.image);
        assert!(coarse.bytes.len() < compressed.bytes.len());
    }

    /// Inserts an APP1 EXIF segment carrying `orientation` after the JPEG SOI marker.
    fn with_exif_orientation(jpeg: &[u8], orientation: u8) -> Vec<u8> {
        let mut payload = b"Exif\0\0".to_vec();
        // Big-endian TIFF header, IFD0 at offset 8 with one SHORT entry.
        payload.extend_from_slice(&[b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08]);
        payload.extend_from_slice(&[0x00, 0x01]);
        payload.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        payload.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
        payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let length = u16::try_from(payload.len() + 2).unwrap().to_be_bytes();
        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1, length[0], length[1]]);
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn exif_rotated_jpeg_is_turned_upright() {
        let jpeg = encoded(
            RgbaImage::from_pixel(64, 32, Rgba([10, 20, 30, 255])),
            ImageFormat::Jpeg,
        );
        let bytes = with_exif_orientation(&jpeg, 6);
        assert_eq!(Orientation::read(&bytes).value(), 6);

        let compressed = compress(&upload(bytes, "image/jpeg"), &ImageLimits::avatar()).unwrap();
        assert_eq!(compressed.orientation.value(), 6);
        assert_eq!(compressed.dimensions(), (32, 64));
    }

    #[test]
    fn truncated_image_is_a_decode_error() {
        let mut bytes = encoded(
            RgbaImage::from_pixel(64, 64, Rgba([10, 20, 30, 255])),
            ImageFormat::Jpeg,
        );
        bytes.truncate(40);
        let err = compress(&upload(bytes, "image/jpeg"), &ImageLimits::avatar()).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn images_without_exif_are_upright() {
        let bytes = encoded(
            RgbaImage::from_pixel(64, 32, Rgba([10, 20, 30, 255])),
            ImageFormat::Jpeg,
        );
        let compressed = compress(&upload(bytes, "image/jpeg"), &ImageLimits::avatar()).unwrap();
        assert!(compressed.orientation.is_upright());
        assert_eq!(compressed.dimensions(), (64, 32));
    }
}
