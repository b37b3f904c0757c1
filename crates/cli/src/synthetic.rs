//! Synthetic lake scenes for demonstrations and smoke tests.
//!
//! A circular lake sits in the middle of a vegetated background. Land
//! reflects green 0.1-0.3, NIR 0.4-0.6, SWIR 0.3-0.5; water reflects green
//! 0.05-0.15, NIR 0.01-0.05, SWIR 0.01-0.03. Values are drawn from a
//! deterministic per-pixel hash so repeated runs produce identical scenes.

use lakewatch_algorithms::imagery::{Band, SpectralBands};
use lakewatch_core::{GeoTransform, Raster, Result};

pub struct SceneParams {
    pub size: usize,
    pub lake_radius: f64,
    pub pixel_size_m: f64,
    pub seed: u64,
}

pub fn lake_scene(params: &SceneParams) -> Result<SpectralBands> {
    let center = params.size as f64 / 2.0;
    let ranges = [
        (Band::Green, (0.05, 0.15), (0.1, 0.3)),
        (Band::Nir, (0.01, 0.05), (0.4, 0.6)),
        (Band::Swir, (0.01, 0.03), (0.3, 0.5)),
    ];

    let mut bands = SpectralBands::new();
    for (band_idx, (band, water, land)) in ranges.into_iter().enumerate() {
        let mut data = Vec::with_capacity(params.size * params.size);
        for row in 0..params.size {
            for col in 0..params.size {
                let dy = row as f64 - center;
                let dx = col as f64 - center;
                let (lo, hi) = if (dx * dx + dy * dy).sqrt() <= params.lake_radius {
                    water
                } else {
                    land
                };
                let u = unit_noise(params.seed, band_idx as u64, row, col);
                data.push(lo + (hi - lo) * u);
            }
        }
        let mut raster = Raster::from_vec(data, params.size, params.size)?;
        raster.set_transform(GeoTransform::with_pixel_size(params.pixel_size_m));
        bands.insert(band, raster)?;
    }
    Ok(bands)
}

/// Uniform value in [0, 1) from a SplitMix64 hash of the pixel position
fn unit_noise(seed: u64, band: u64, row: usize, col: usize) -> f64 {
    let mut z = seed
        ^ band.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (row as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9)
        ^ (col as u64).wrapping_mul(0x94D0_49BB_1331_11EB);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}
