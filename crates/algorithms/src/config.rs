//! Analysis configuration
//!
//! Bundles every tunable of the pipeline so callers can load one document
//! (e.g. JSON) instead of threading individual parameter structs. Missing
//! fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::imagery::{IndexKind, ThresholdMethod};
use crate::timeseries::{AnomalyParams, Hemisphere, SeasonConfig, TrendParams};
use lakewatch_core::{Error, Result};

/// Landsat pixel edge length in meters
pub const DEFAULT_PIXEL_SIZE_M: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub index: IndexKind,
    pub threshold: ThresholdMethod,
    /// Used when automatic thresholding meets a degenerate histogram
    pub fallback_threshold: f64,
    pub pixel_size_m: f64,
    pub trend: TrendParams,
    pub anomaly: AnomalyParams,
    pub hemisphere: Hemisphere,
    /// Explicit month→season table; overrides `hemisphere` when set
    pub seasons: Option<SeasonConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            index: IndexKind::default(),
            threshold: ThresholdMethod::default(),
            fallback_threshold: 0.0,
            pixel_size_m: DEFAULT_PIXEL_SIZE_M,
            trend: TrendParams::default(),
            anomaly: AnomalyParams::default(),
            hemisphere: Hemisphere::default(),
            seasons: None,
        }
    }
}

impl AnalysisConfig {
    /// Season table in effect
    pub fn season_config(&self) -> SeasonConfig {
        self.seasons
            .unwrap_or_else(|| SeasonConfig::for_hemisphere(self.hemisphere))
    }

    /// Reject values no analysis could use
    pub fn validate(&self) -> Result<()> {
        if !(self.pixel_size_m.is_finite() && self.pixel_size_m > 0.0) {
            return Err(Error::InvalidPixelSize(self.pixel_size_m));
        }
        if let ThresholdMethod::Automatic(bins) = self.threshold {
            if bins < 2 {
                return Err(Error::InvalidParameter {
                    name: "threshold",
                    value: bins.to_string(),
                    reason: "automatic thresholding needs at least 2 bins".into(),
                });
            }
        }
        if self.trend.stable_epsilon.is_nan() || self.trend.stable_epsilon < 0.0 {
            return Err(Error::InvalidParameter {
                name: "trend.stable_epsilon",
                value: self.trend.stable_epsilon.to_string(),
                reason: "must be non-negative".into(),
            });
        }
        Ok(())
    }
}
