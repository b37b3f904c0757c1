//! Water mask extraction and area measurement
//!
//! A pixel is water iff its index value is strictly greater than the
//! threshold. The threshold is either supplied by the caller or found with
//! Otsu's method over a histogram of the valid index values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::imagery::indices::{compute_index, IndexImage, WaterIndex};
use crate::maybe_rayon::*;
use crate::timeseries::AreaMeasurement;
use lakewatch_core::raster::Raster;
use lakewatch_core::{Error, Result};

/// Default number of histogram bins for automatic thresholding
pub const DEFAULT_HISTOGRAM_BINS: usize = 256;

/// How the water/non-water threshold is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Fixed threshold supplied by the caller
    Manual(f64),
    /// Otsu's method over the given number of histogram bins
    Automatic(usize),
}

impl ThresholdMethod {
    /// Automatic thresholding with [`DEFAULT_HISTOGRAM_BINS`]
    pub fn otsu() -> Self {
        ThresholdMethod::Automatic(DEFAULT_HISTOGRAM_BINS)
    }

    /// Resolve the numeric threshold for `index`
    pub fn resolve(&self, index: &IndexImage) -> Result<f64> {
        match *self {
            ThresholdMethod::Manual(t) => Ok(t),
            ThresholdMethod::Automatic(bins) => otsu_threshold(index, bins),
        }
    }
}

impl Default for ThresholdMethod {
    fn default() -> Self {
        ThresholdMethod::Manual(0.0)
    }
}

/// Binary water/non-water classification of an index image.
///
/// Stored as a `u8` raster with 1 = water, 0 = non-water.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterMask {
    raster: Raster<u8>,
    threshold: Option<f64>,
}

impl WaterMask {
    /// Wrap a 0/1 raster. Any non-zero cell is treated as water.
    pub fn from_raster(raster: Raster<u8>) -> Self {
        let mut out = Raster::from_array(raster.data().mapv(|v| u8::from(v != 0)));
        out.set_transform(*raster.transform());
        Self {
            raster: out,
            threshold: None,
        }
    }

    /// Build a mask from row-major water flags
    pub fn from_bools(flags: &[bool], rows: usize, cols: usize) -> Result<Self> {
        let data = flags.iter().map(|&w| u8::from(w)).collect();
        Ok(Self {
            raster: Raster::from_vec(data, rows, cols)?,
            threshold: None,
        })
    }

    pub(crate) fn from_parts(raster: Raster<u8>, threshold: Option<f64>) -> Self {
        Self { raster, threshold }
    }

    /// Underlying 0/1 raster
    pub fn raster(&self) -> &Raster<u8> {
        &self.raster
    }

    /// Threshold the mask was extracted with, if it came from an index image
    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn shape(&self) -> (usize, usize) {
        self.raster.shape()
    }

    pub fn len(&self) -> usize {
        self.raster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raster.is_empty()
    }

    pub fn is_water(&self, row: usize, col: usize) -> Result<bool> {
        Ok(self.raster.get(row, col)? != 0)
    }

    /// Number of water pixels
    pub fn water_pixels(&self) -> usize {
        self.raster.iter().filter(|&&v| v != 0).count()
    }

    /// Fail with [`Error::ShapeMismatch`] unless `other` has the same shape
    pub fn ensure_same_shape(&self, other: &WaterMask) -> Result<()> {
        self.raster.ensure_same_shape(&other.raster)
    }
}

/// Water area derived from a mask and a pixel size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterArea {
    pub water_pixels: usize,
    /// Pixel edge length in meters
    pub pixel_size_m: f64,
    pub area_m2: f64,
    pub area_km2: f64,
}

impl WaterArea {
    /// Attach an observation date, producing a time-series sample
    pub fn observed_on(&self, date: NaiveDate) -> AreaMeasurement {
        AreaMeasurement::with_pixel_size(date, self.area_km2, self.pixel_size_m)
    }
}

/// Find the threshold separating water from land with Otsu's method.
///
/// The valid (non-NaN) index values are binned into `bins` equal-width bins
/// between their minimum and maximum. The split that maximizes the
/// between-class variance `w0 * w1 * (mu0 - mu1)^2` is chosen and the
/// largest value of its lower class is returned, so pixels strictly above the
/// threshold are exactly the upper class.
///
/// Fails with [`Error::DegenerateHistogram`] when there are no valid values
/// or all valid values are equal, and with [`Error::InvalidParameter`] when
/// `bins < 2`.
pub fn otsu_threshold(index: &IndexImage, bins: usize) -> Result<f64> {
    if bins < 2 {
        return Err(Error::InvalidParameter {
            name: "bins",
            value: bins.to_string(),
            reason: "at least 2 histogram bins are required".into(),
        });
    }

    let values: Vec<f64> = index.iter().copied().filter(|v| v.is_finite()).collect();
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if values.is_empty() || max - min <= 0.0 {
        return Err(Error::DegenerateHistogram);
    }

    let width = (max - min) / bins as f64;
    let bin_of = |v: f64| (((v - min) / width) as usize).min(bins - 1);
    let mut histogram = vec![0usize; bins];
    for &v in &values {
        histogram[bin_of(v)] += 1;
    }

    let total = values.len() as f64;
    let center = |i: usize| min + (i as f64 + 0.5) * width;
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &n)| n as f64 * center(i))
        .sum();

    let mut best_split = 0;
    let mut best_variance = f64::NEG_INFINITY;
    let mut weight_low = 0.0;
    let mut sum_low = 0.0;

    for (i, &n) in histogram.iter().enumerate().take(bins - 1) {
        weight_low += n as f64;
        sum_low += n as f64 * center(i);
        let weight_high = total - weight_low;
        if weight_low == 0.0 || weight_high == 0.0 {
            continue;
        }
        let mean_low = sum_low / weight_low;
        let mean_high = (total_sum - sum_low) / weight_high;
        let variance = weight_low * weight_high * (mean_low - mean_high).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_split = i;
        }
    }

    let threshold = values
        .iter()
        .copied()
        .filter(|&v| bin_of(v) <= best_split)
        .fold(min, f64::max);
    debug!(bins, min, max, threshold, "otsu threshold selected");
    Ok(threshold)
}

/// Classify `index` into a water mask using `method`.
///
/// Errors from automatic thresholding are returned unchanged; use
/// [`extract_mask_or`] to fall back to a fixed threshold instead.
pub fn extract_mask(index: &IndexImage, method: ThresholdMethod) -> Result<WaterMask> {
    let threshold = method.resolve(index)?;
    threshold_mask(index, threshold)
}

/// Like [`extract_mask`], but a [`Error::DegenerateHistogram`] from automatic
/// thresholding falls back to `fallback_threshold`.
pub fn extract_mask_or(
    index: &IndexImage,
    method: ThresholdMethod,
    fallback_threshold: f64,
) -> Result<WaterMask> {
    match method.resolve(index) {
        Ok(threshold) => threshold_mask(index, threshold),
        Err(Error::DegenerateHistogram) => {
            warn!(
                fallback_threshold,
                "index image has no spread; using fallback threshold"
            );
            threshold_mask(index, fallback_threshold)
        }
        Err(e) => Err(e),
    }
}

/// Compute an index image and its water mask in one step
pub fn water_extent(
    formula: WaterIndex<'_>,
    method: ThresholdMethod,
) -> Result<(IndexImage, WaterMask)> {
    let index = compute_index(formula)?;
    let mask = extract_mask(&index, method)?;
    Ok((index, mask))
}

fn threshold_mask(index: &IndexImage, threshold: f64) -> Result<WaterMask> {
    let (rows, _) = index.shape();
    let data = index.data();

    let flags: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            data.row(row)
                .iter()
                .map(|&v| u8::from(!index.is_nodata(v) && v > threshold))
                .collect::<Vec<u8>>()
        })
        .collect();

    let raster = index.derive(flags, None)?;
    Ok(WaterMask::from_parts(raster, Some(threshold)))
}

/// Convert a mask's water-pixel count into area.
///
/// `area_km2 = water_pixels * pixel_size_m^2 / 1e6`
///
/// Fails with [`Error::InvalidPixelSize`] unless `pixel_size_m > 0`.
pub fn compute_area(mask: &WaterMask, pixel_size_m: f64) -> Result<WaterArea> {
    if !(pixel_size_m.is_finite() && pixel_size_m > 0.0) {
        return Err(Error::InvalidPixelSize(pixel_size_m));
    }
    Ok(area_of(mask, pixel_size_m, pixel_size_m * pixel_size_m))
}

/// [`compute_area`] using the pixel footprint of the mask's geotransform.
///
/// Pixels need not be square; the reported `pixel_size_m` is the edge of a
/// square pixel with the same footprint.
pub fn compute_area_from_transform(mask: &WaterMask) -> Result<WaterArea> {
    let pixel_area_m2 = mask.raster().transform().pixel_area();
    let pixel_size_m = pixel_area_m2.sqrt();
    if !(pixel_area_m2.is_finite() && pixel_area_m2 > 0.0) {
        return Err(Error::InvalidPixelSize(pixel_size_m));
    }
    Ok(area_of(mask, pixel_size_m, pixel_area_m2))
}

fn area_of(mask: &WaterMask, pixel_size_m: f64, pixel_area_m2: f64) -> WaterArea {
    let water_pixels = mask.water_pixels();
    let area_m2 = water_pixels as f64 * pixel_area_m2;
    WaterArea {
        water_pixels,
        pixel_size_m,
        area_m2,
        area_km2: area_m2 / 1_000_000.0,
    }
}
