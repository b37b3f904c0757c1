//! Imagery analysis algorithms
//!
//! Algorithms for mapping surface water from multispectral imagery:
//! - Water indices: NDWI, MNDWI
//! - Water masks: manual or Otsu thresholding, pixel-to-area conversion
//! - Change detection: per-pixel transitions, multi-date envelopes, index difference

mod change_detection;
mod indices;
mod water_mask;

pub use change_detection::{
    compare_multiple, detect_change, index_difference, ChangeClass, ChangeMap, ChangeStats,
    ClassShare, MultiTemporalReport, PairwiseChange,
};
pub use indices::{
    compute_index, mndwi, ndwi, Band, IndexImage, IndexKind, SpectralBands, WaterIndex,
};
pub use water_mask::{
    compute_area, compute_area_from_transform, extract_mask, extract_mask_or, otsu_threshold,
    water_extent, ThresholdMethod, WaterArea, WaterMask, DEFAULT_HISTOGRAM_BINS,
};
