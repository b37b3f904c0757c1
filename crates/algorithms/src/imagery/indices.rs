//! Normalized water indices
//!
//! Water indices computed from co-registered single-band rasters:
//! - NDWI (McFeeters, 1996): `(Green - NIR) / (Green + NIR)`
//! - MNDWI (Xu, 2006): `(Green - SWIR) / (Green + SWIR)`
//!
//! Positive values indicate open water.

use std::collections::BTreeMap;

use crate::maybe_rayon::*;
use lakewatch_core::raster::Raster;
use lakewatch_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// An index image: one normalized index value per pixel, in [-1, 1].
///
/// Pixels whose source reflectance is no-data are NaN.
pub type IndexImage = Raster<f64>;

/// Spectral band roles delivered by the imagery provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Blue,
    Green,
    Red,
    Nir,
    Swir,
}

impl Band {
    pub fn name(&self) -> &'static str {
        match self {
            Band::Blue => "blue",
            Band::Green => "green",
            Band::Red => "red",
            Band::Nir => "nir",
            Band::Swir => "swir",
        }
    }
}

/// Which water index formula to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    #[default]
    Ndwi,
    Mndwi,
}

impl IndexKind {
    /// The two band roles the formula reads, numerator-positive first
    pub fn bands(&self) -> (Band, Band) {
        match self {
            IndexKind::Ndwi => (Band::Green, Band::Nir),
            IndexKind::Mndwi => (Band::Green, Band::Swir),
        }
    }
}

/// A water index formula bound to the bands it reads.
///
/// Constructing the variant requires exactly the band roles the formula
/// needs, so an MNDWI without a SWIR band cannot be expressed.
#[derive(Debug, Clone, Copy)]
pub enum WaterIndex<'a> {
    /// Normalized Difference Water Index
    Ndwi {
        green: &'a Raster<f64>,
        nir: &'a Raster<f64>,
    },
    /// Modified Normalized Difference Water Index
    Mndwi {
        green: &'a Raster<f64>,
        swir: &'a Raster<f64>,
    },
}

impl<'a> WaterIndex<'a> {
    pub fn kind(&self) -> IndexKind {
        match self {
            WaterIndex::Ndwi { .. } => IndexKind::Ndwi,
            WaterIndex::Mndwi { .. } => IndexKind::Mndwi,
        }
    }

    /// `(band_a, band_b)` so that the index is `(a - b) / (a + b)`
    pub fn operands(&self) -> (&'a Raster<f64>, &'a Raster<f64>) {
        match *self {
            WaterIndex::Ndwi { green, nir } => (green, nir),
            WaterIndex::Mndwi { green, swir } => (green, swir),
        }
    }
}

/// Named, co-registered spectral bands for one scene.
///
/// Every band stored here has the same shape; inserting a band of a
/// different shape fails with [`Error::ShapeMismatch`].
#[derive(Debug, Clone, Default)]
pub struct SpectralBands {
    bands: BTreeMap<Band, Raster<f64>>,
}

impl SpectralBands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a band
    pub fn insert(&mut self, band: Band, raster: Raster<f64>) -> Result<()> {
        if let Some(existing) = self.bands.values().next() {
            existing.ensure_same_shape(&raster)?;
        }
        self.bands.insert(band, raster);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, band: Band, raster: Raster<f64>) -> Result<Self> {
        self.insert(band, raster)?;
        Ok(self)
    }

    pub fn get(&self, band: Band) -> Option<&Raster<f64>> {
        self.bands.get(&band)
    }

    fn require(&self, band: Band) -> Result<&Raster<f64>> {
        self.get(band).ok_or(Error::MissingBand(band.name()))
    }

    /// Shape shared by all bands, if any band is present
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.bands.values().next().map(|r| r.shape())
    }

    /// Bind the bands needed by `kind`, failing with [`Error::MissingBand`]
    pub fn water_index(&self, kind: IndexKind) -> Result<WaterIndex<'_>> {
        Ok(match kind {
            IndexKind::Ndwi => WaterIndex::Ndwi {
                green: self.require(Band::Green)?,
                nir: self.require(Band::Nir)?,
            },
            IndexKind::Mndwi => WaterIndex::Mndwi {
                green: self.require(Band::Green)?,
                swir: self.require(Band::Swir)?,
            },
        })
    }
}

/// Compute a water index image.
///
/// Per pixel `(a - b) / (a + b)` where `(a, b)` are the formula's operands.
///
/// - Where `a + b = 0` the output is `0.0`, which thresholds as non-water.
/// - Where either input is no-data (NaN or the raster's nodata value) the
///   output is NaN.
/// - Results are clamped to [-1, 1] so negative reflectance noise cannot
///   push a pixel out of range.
///
/// Fails with [`Error::ShapeMismatch`] if the two bands differ in shape.
pub fn compute_index(formula: WaterIndex<'_>) -> Result<IndexImage> {
    let (band_a, band_b) = formula.operands();
    normalized_difference(band_a, band_b)
}

/// Normalized Difference Water Index, `(green - nir) / (green + nir)`
pub fn ndwi(green: &Raster<f64>, nir: &Raster<f64>) -> Result<IndexImage> {
    compute_index(WaterIndex::Ndwi { green, nir })
}

/// Modified NDWI, `(green - swir) / (green + swir)`.
///
/// Suppresses built-up land noise better than NDWI.
pub fn mndwi(green: &Raster<f64>, swir: &Raster<f64>) -> Result<IndexImage> {
    compute_index(WaterIndex::Mndwi { green, swir })
}

fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<IndexImage> {
    band_a.ensure_same_shape(band_b)?;

    let (rows, _) = band_a.shape();
    let a_data = band_a.data();
    let b_data = band_b.data();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            a_data
                .row(row)
                .iter()
                .zip(b_data.row(row).iter())
                .map(|(&a, &b)| {
                    if band_a.is_nodata(a) || band_b.is_nodata(b) {
                        return f64::NAN;
                    }
                    let sum = a + b;
                    if sum == 0.0 {
                        return 0.0;
                    }
                    ((a - b) / sum).clamp(-1.0, 1.0)
                })
                .collect::<Vec<f64>>()
        })
        .collect();

    band_a.derive(data, Some(f64::NAN))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lakewatch_core::GeoTransform;

    fn make_band(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::with_pixel_size(30.0));
        r
    }

    fn make_gradient(rows: usize, cols: usize, start: f64, step: f64) -> Raster<f64> {
        let data = (0..rows * cols).map(|i| start + i as f64 * step).collect();
        Raster::from_vec(data, rows, cols).unwrap()
    }

    #[test]
    fn test_ndwi_water_pixel() {
        let green = make_band(5, 5, 0.3);
        let nir = make_band(5, 5, 0.1);

        let result = ndwi(&green, &nir).unwrap();
        // (0.3 - 0.1) / (0.3 + 0.1) = 0.5
        assert_relative_eq!(result.get(2, 2).unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(result.transform().pixel_area(), 900.0);
    }

    #[test]
    fn test_mndwi_land_pixel() {
        let green = make_band(3, 3, 0.1);
        let swir = make_band(3, 3, 0.3);

        let result = mndwi(&green, &swir).unwrap();
        assert_relative_eq!(result.get(0, 0).unwrap(), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_denominator_is_zero() {
        let green = Raster::from_vec(vec![0.0, 0.2, 0.0, 0.4], 2, 2).unwrap();
        let nir = Raster::from_vec(vec![0.0, 0.2, 0.0, 0.0], 2, 2).unwrap();

        let result = ndwi(&green, &nir).unwrap();
        assert_eq!(result.get(0, 0).unwrap(), 0.0);
        assert_eq!(result.get(1, 0).unwrap(), 0.0);
        assert_eq!(result.get(0, 1).unwrap(), 0.0);
        assert_eq!(result.get(1, 1).unwrap(), 1.0);
    }

    #[test]
    fn test_index_range() {
        let a = make_gradient(10, 10, 0.0, 0.01);
        let b = make_gradient(10, 10, 0.5, -0.005);

        let result = ndwi(&a, &b).unwrap();
        for &v in result.iter() {
            assert!((-1.0..=1.0).contains(&v), "index out of range: {}", v);
        }
    }

    #[test]
    fn test_negative_reflectance_clamped() {
        let green = Raster::from_vec(vec![0.3], 1, 1).unwrap();
        let nir = Raster::from_vec(vec![-0.2], 1, 1).unwrap();

        let result = ndwi(&green, &nir).unwrap();
        assert_eq!(result.get(0, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_nodata_propagates() {
        let mut green = make_band(3, 3, 0.3);
        green.set(1, 1, f64::NAN).unwrap();
        let mut nir = make_band(3, 3, 0.1);
        nir.set_nodata(Some(-9999.0));
        nir.set(0, 0, -9999.0).unwrap();

        let result = ndwi(&green, &nir).unwrap();
        assert!(result.get(1, 1).unwrap().is_nan());
        assert!(result.get(0, 0).unwrap().is_nan());
        assert!(!result.get(2, 2).unwrap().is_nan());
    }

    #[test]
    fn test_shape_mismatch() {
        let green = make_band(5, 5, 0.3);
        let nir = make_band(5, 4, 0.1);

        let err = ndwi(&green, &nir).unwrap_err();
        assert_eq!(err, Error::ShapeMismatch { er: 5, ec: 5, ar: 5, ac: 4 });
    }

    #[test]
    fn test_spectral_bands_binding() {
        let bands = SpectralBands::new()
            .with(Band::Green, make_band(4, 4, 0.3))
            .unwrap()
            .with(Band::Nir, make_band(4, 4, 0.1))
            .unwrap();

        let formula = bands.water_index(IndexKind::Ndwi).unwrap();
        assert_eq!(formula.kind(), IndexKind::Ndwi);
        assert!(compute_index(formula).is_ok());

        let err = bands.water_index(IndexKind::Mndwi).unwrap_err();
        assert_eq!(err, Error::MissingBand("swir"));
    }

    #[test]
    fn test_spectral_bands_reject_misaligned() {
        let mut bands = SpectralBands::new();
        bands.insert(Band::Green, make_band(4, 4, 0.3)).unwrap();
        let err = bands.insert(Band::Swir, make_band(3, 4, 0.1)).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        assert_eq!(bands.shape(), Some((4, 4)));
    }
}
