// SPDX-License-Identifier: MPL-2.0
//! Image transform pipeline for avatar and background uploads.
//!
//! Stages run in order: [`validate`] → [`compress`] → [`crop`] →
//! [`raster`] → upload through [`pipeline::ImagePipeline`].

pub mod cache;
pub mod compress;
pub mod crop;
pub mod pipeline;
pub mod raster;
pub mod transform;
pub mod validate;

// Re-export commonly used types
pub use compress::CompressedImage;
pub use crop::{CropAdjustments, CropSession};
pub use pipeline::{
    ImagePipeline, PreparedImage, PublishedImage, RemovalOutcome, RenderedImage, SourceOrigin,
};
pub use raster::CropParams;
pub use transform::Orientation;
pub use validate::ValidatedUpload;
