//! Water change detection
//!
//! Methods for comparing water extent between observation dates:
//! - Per-pixel transition classification between two water masks
//! - Multi-date comparison with per-date areas and extent envelopes
//! - Index difference (change intensity) between two index images

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::imagery::indices::IndexImage;
use crate::imagery::water_mask::{compute_area, WaterMask};
use crate::maybe_rayon::*;
use crate::timeseries::{AreaMeasurement, TimeSeries};
use lakewatch_core::raster::Raster;
use lakewatch_core::{Error, Result};

/// Transition of one pixel between two dates.
///
/// The discriminant is the code stored in a [`ChangeMap`] raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ChangeClass {
    StableNonWater = 0,
    StableWater = 1,
    /// Water at T1, non-water at T2
    WaterLoss = 2,
    /// Non-water at T1, water at T2
    WaterGain = 3,
}

impl ChangeClass {
    pub const ALL: [ChangeClass; 4] = [
        ChangeClass::StableNonWater,
        ChangeClass::StableWater,
        ChangeClass::WaterLoss,
        ChangeClass::WaterGain,
    ];

    /// Classify a pixel from its water state at T1 and T2
    pub fn classify(water_t1: bool, water_t2: bool) -> Self {
        match (water_t1, water_t2) {
            (true, true) => ChangeClass::StableWater,
            (false, false) => ChangeClass::StableNonWater,
            (true, false) => ChangeClass::WaterLoss,
            (false, true) => ChangeClass::WaterGain,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ChangeClass::StableNonWater),
            1 => Some(ChangeClass::StableWater),
            2 => Some(ChangeClass::WaterLoss),
            3 => Some(ChangeClass::WaterGain),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChangeClass::StableNonWater => "stable-non-water",
            ChangeClass::StableWater => "stable-water",
            ChangeClass::WaterLoss => "water-loss",
            ChangeClass::WaterGain => "water-gain",
        }
    }
}

/// Categorical map of [`ChangeClass`] codes, same shape as its input masks
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeMap {
    raster: Raster<u8>,
}

impl ChangeMap {
    /// Underlying raster of [`ChangeClass::code`] values
    pub fn raster(&self) -> &Raster<u8> {
        &self.raster
    }

    pub fn shape(&self) -> (usize, usize) {
        self.raster.shape()
    }

    pub fn get(&self, row: usize, col: usize) -> Result<ChangeClass> {
        let code = self.raster.get(row, col)?;
        ChangeClass::from_code(code)
            .ok_or_else(|| Error::Other(format!("invalid change code {}", code)))
    }

    pub fn count(&self, class: ChangeClass) -> usize {
        let code = class.code();
        self.raster.iter().filter(|&&c| c == code).count()
    }
}

/// Pixel count and share of the scene for one change class
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassShare {
    pub pixels: usize,
    /// Percentage of all pixels, 0-100
    pub percent: f64,
}

/// Aggregate statistics of a [`ChangeMap`].
///
/// The four class percentages sum to 100 (0 for an empty scene).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeStats {
    pub total_pixels: usize,
    pub stable_water: ClassShare,
    pub stable_non_water: ClassShare,
    pub water_loss: ClassShare,
    pub water_gain: ClassShare,
    /// `water_gain - water_loss`
    pub net_change_pixels: i64,
    pub net_change_percent: f64,
}

impl ChangeStats {
    fn from_counts(counts: [usize; 4]) -> Self {
        let total_pixels: usize = counts.iter().sum();
        let share = |class: ChangeClass| {
            let pixels = counts[class.code() as usize];
            ClassShare {
                pixels,
                percent: percent_of(pixels as f64, total_pixels),
            }
        };
        let gain = counts[ChangeClass::WaterGain.code() as usize] as i64;
        let loss = counts[ChangeClass::WaterLoss.code() as usize] as i64;

        Self {
            total_pixels,
            stable_water: share(ChangeClass::StableWater),
            stable_non_water: share(ChangeClass::StableNonWater),
            water_loss: share(ChangeClass::WaterLoss),
            water_gain: share(ChangeClass::WaterGain),
            net_change_pixels: gain - loss,
            net_change_percent: percent_of((gain - loss) as f64, total_pixels),
        }
    }

    pub fn share(&self, class: ChangeClass) -> ClassShare {
        match class {
            ChangeClass::StableNonWater => self.stable_non_water,
            ChangeClass::StableWater => self.stable_water,
            ChangeClass::WaterLoss => self.water_loss,
            ChangeClass::WaterGain => self.water_gain,
        }
    }

    /// Water pixels at the earlier date
    pub fn water_pixels_t1(&self) -> usize {
        self.stable_water.pixels + self.water_loss.pixels
    }

    /// Water pixels at the later date
    pub fn water_pixels_t2(&self) -> usize {
        self.stable_water.pixels + self.water_gain.pixels
    }
}

fn percent_of(value: f64, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        value / total as f64 * 100.0
    }
}

/// Classify per-pixel water transitions between two masks.
///
/// | T1 | T2 | class |
/// |----|----|-------|
/// | water | water | stable water |
/// | non-water | non-water | stable non-water |
/// | water | non-water | water loss |
/// | non-water | water | water gain |
///
/// Fails with [`Error::ShapeMismatch`] if the masks differ in shape.
pub fn detect_change(mask_t1: &WaterMask, mask_t2: &WaterMask) -> Result<(ChangeMap, ChangeStats)> {
    mask_t1.ensure_same_shape(mask_t2)?;

    let (rows, _) = mask_t1.shape();
    let t1 = mask_t1.raster().data();
    let t2 = mask_t2.raster().data();

    let codes: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            t1.row(row)
                .iter()
                .zip(t2.row(row).iter())
                .map(|(&a, &b)| ChangeClass::classify(a != 0, b != 0).code())
                .collect::<Vec<u8>>()
        })
        .collect();

    let mut counts = [0usize; 4];
    for &code in &codes {
        counts[code as usize] += 1;
    }

    let raster = mask_t1.raster().derive(codes, None)?;
    Ok((ChangeMap { raster }, ChangeStats::from_counts(counts)))
}

/// Change between two consecutive observation dates
#[derive(Debug, Clone)]
pub struct PairwiseChange {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub change_map: ChangeMap,
    pub stats: ChangeStats,
}

/// Result of [`compare_multiple`]
#[derive(Debug, Clone)]
pub struct MultiTemporalReport {
    pub dates: Vec<NaiveDate>,
    /// Water area per date, in input order
    pub areas: Vec<AreaMeasurement>,
    /// Change between each consecutive pair of dates, in input order
    pub changes: Vec<PairwiseChange>,
    /// Pixels that were water on any date (maximum extent)
    pub ever_water: WaterMask,
    /// Pixels that were water on every date (minimum extent)
    pub always_water: WaterMask,
    pub max_area_km2: f64,
    pub min_area_km2: f64,
}

impl MultiTemporalReport {
    /// Per-date areas as a time series ready for analysis
    pub fn time_series(&self) -> Result<TimeSeries> {
        TimeSeries::new(self.areas.clone())
    }
}

/// Compare water masks across a sequence of dates.
///
/// Requires `masks.len() == dates.len() >= 2`, strictly increasing dates and
/// equally-shaped masks. Computes the water area of every mask, the change
/// between each consecutive pair, and the union/intersection envelope.
///
/// Pairwise comparisons are independent and run in parallel when the
/// `parallel` feature is enabled; output order always follows `dates`.
pub fn compare_multiple(
    masks: &[WaterMask],
    dates: &[NaiveDate],
    pixel_size_m: f64,
) -> Result<MultiTemporalReport> {
    if masks.len() < 2 {
        return Err(Error::InsufficientData {
            required: 2,
            found: masks.len(),
        });
    }
    if dates.len() != masks.len() {
        return Err(Error::InvalidParameter {
            name: "dates",
            value: dates.len().to_string(),
            reason: format!("expected one date per mask ({})", masks.len()),
        });
    }
    for pair in dates.windows(2) {
        if pair[1] <= pair[0] {
            return Err(Error::UnorderedTimestamps {
                previous: pair[0].to_string(),
                next: pair[1].to_string(),
            });
        }
    }
    for mask in &masks[1..] {
        masks[0].ensure_same_shape(mask)?;
    }

    let areas = masks
        .iter()
        .zip(dates)
        .map(|(mask, &date)| Ok(compute_area(mask, pixel_size_m)?.observed_on(date)))
        .collect::<Result<Vec<_>>>()?;

    let changes = (0..masks.len() - 1)
        .into_par_iter()
        .map(|i| {
            let (change_map, stats) = detect_change(&masks[i], &masks[i + 1])?;
            Ok(PairwiseChange {
                from: dates[i],
                to: dates[i + 1],
                change_map,
                stats,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let (ever_water, always_water) = extent_envelope(masks)?;
    let max_area_km2 = compute_area(&ever_water, pixel_size_m)?.area_km2;
    let min_area_km2 = compute_area(&always_water, pixel_size_m)?.area_km2;
    debug!(
        dates = dates.len(),
        max_area_km2, min_area_km2, "multi-temporal comparison complete"
    );

    Ok(MultiTemporalReport {
        dates: dates.to_vec(),
        areas,
        changes,
        ever_water,
        always_water,
        max_area_km2,
        min_area_km2,
    })
}

/// Pixel-wise union and intersection of equally-shaped masks
fn extent_envelope(masks: &[WaterMask]) -> Result<(WaterMask, WaterMask)> {
    let first = masks[0].raster();
    let mut union = first.data().mapv(|v| u8::from(v != 0));
    let mut intersection = union.clone();

    for mask in &masks[1..] {
        ndarray::Zip::from(&mut union)
            .and(&mut intersection)
            .and(mask.raster().data())
            .for_each(|u, i, &m| {
                let water = u8::from(m != 0);
                *u |= water;
                *i &= water;
            });
    }

    let union = first.derive(union.iter().copied().collect(), None)?;
    let intersection = first.derive(intersection.iter().copied().collect(), None)?;
    Ok((WaterMask::from_raster(union), WaterMask::from_raster(intersection)))
}

/// Change intensity: `index_t2 - index_t1` per pixel.
///
/// Positive values mean the pixel became more water-like.
pub fn index_difference(index_t1: &IndexImage, index_t2: &IndexImage) -> Result<IndexImage> {
    index_t1.ensure_same_shape(index_t2)?;
    let diff = index_t2.data() - index_t1.data();
    index_t1.derive(diff.iter().copied().collect(), Some(f64::NAN))
}
