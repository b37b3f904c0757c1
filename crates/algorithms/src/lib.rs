//! # LakeWatch Algorithms
//!
//! Lake-monitoring analysis engine.
//!
//! ## Available Algorithm Categories
//!
//! - **imagery**: Water indices, water masks and area, change detection
//! - **timeseries**: Summary statistics, trend, seasonality, resampling, anomalies
//! - **config**: Serializable bundle of every tunable parameter

pub mod config;
pub mod imagery;
pub(crate) mod maybe_rayon;
pub mod timeseries;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::AnalysisConfig;
    pub use crate::imagery::{
        compare_multiple, compute_area, compute_index, detect_change, extract_mask,
        extract_mask_or, mndwi, ndwi, Band, ChangeClass, ChangeStats, IndexKind, SpectralBands,
        ThresholdMethod, WaterIndex, WaterMask,
    };
    pub use crate::timeseries::{
        anomalies, describe, linear_trend, resample, seasonal_summary, AnomalyParams,
        AreaMeasurement, Frequency, SeasonConfig, TimeSeries, TrendParams,
    };
    pub use lakewatch_core::prelude::*;
}
