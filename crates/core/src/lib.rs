//! # LakeWatch Core
//!
//! Core types shared by the LakeWatch lake-monitoring crates.
//!
//! This crate provides:
//! - `Raster<T>`: Generic raster grid type used for bands, index images and masks
//! - `GeoTransform`: Affine transformation carrying the pixel size
//! - `Error`: The error taxonomy reported by every analysis operation

pub mod error;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
}
