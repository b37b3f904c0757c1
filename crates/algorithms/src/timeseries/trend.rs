//! Linear trend of water area over time
//!
//! Ordinary least squares of area against days elapsed since the first
//! observation. The fitted slope is reported per day and per year.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TimeSeries;
use lakewatch_core::{Error, Result};

/// Days per year used to scale the per-day slope
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Parameters for trend classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendParams {
    /// Slopes (km²/year) with magnitude below this are labelled stable
    pub stable_epsilon: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            stable_epsilon: 1e-9,
        }
    }
}

/// Direction of a fitted trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

/// Fitted linear trend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// km² per day
    pub slope_per_day: f64,
    /// km² per year (`slope_per_day * 365.25`)
    pub slope_per_year: f64,
    /// Fitted area (km²) at the first observation date
    pub intercept: f64,
    /// Coefficient of determination
    pub r_squared: f64,
    pub direction: TrendDirection,
    /// Date elapsed time is measured from
    pub origin: NaiveDate,
    pub count: usize,
}

impl TrendResult {
    /// Area predicted by the fit on `date`
    pub fn predict(&self, date: NaiveDate) -> f64 {
        let days = (date - self.origin).num_days() as f64;
        self.intercept + self.slope_per_day * days
    }
}

/// Fit an ordinary least-squares line to the series.
///
/// R² is `1 - SS_res / SS_tot`; a series with no variance in area is fitted
/// exactly by a flat line and reports R² = 1.
///
/// Fails with [`Error::InsufficientData`] for fewer than two observations.
pub fn linear_trend(series: &TimeSeries, params: &TrendParams) -> Result<TrendResult> {
    let obs = series.observations();
    if obs.len() < 2 {
        return Err(Error::InsufficientData {
            required: 2,
            found: obs.len(),
        });
    }

    let origin = obs[0].date;
    let xs: Vec<f64> = obs
        .iter()
        .map(|o| (o.date - origin).num_days() as f64)
        .collect();
    let ys = series.areas();
    let n = obs.len() as f64;

    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        sxy += (x - mean_x) * (y - mean_y);
        sxx += (x - mean_x) * (x - mean_x);
    }
    // Strictly increasing dates guarantee sxx > 0 with two or more points.
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        let fitted = intercept + slope * x;
        ss_res += (y - fitted) * (y - fitted);
        ss_tot += (y - mean_y) * (y - mean_y);
    }
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

    let slope_per_year = slope * DAYS_PER_YEAR;
    let direction = if slope_per_year.abs() < params.stable_epsilon {
        TrendDirection::Stable
    } else if slope_per_year > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    debug!(slope_per_year, intercept, r_squared, "linear trend fitted");

    Ok(TrendResult {
        slope_per_day: slope,
        slope_per_year,
        intercept,
        r_squared,
        direction,
        origin,
        count: obs.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{date, series};
    use super::super::AreaMeasurement;
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn daily_series(values: impl Fn(usize) -> f64, n: usize) -> TimeSeries {
        let start = date(2021, 1, 1);
        TimeSeries::new(
            (0..n)
                .map(|i| AreaMeasurement::new(start + Duration::days(i as i64), values(i)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_perfect_linear_series() {
        let s = daily_series(|i| 100.0 + 2.0 * i as f64, 10);
        let trend = linear_trend(&s, &TrendParams::default()).unwrap();

        assert_relative_eq!(trend.slope_per_day, 2.0, epsilon = 1e-10);
        assert_relative_eq!(trend.slope_per_year, 730.5, epsilon = 1e-8);
        assert_relative_eq!(trend.intercept, 100.0, epsilon = 1e-10);
        assert_relative_eq!(trend.r_squared, 1.0, epsilon = 1e-12);
        assert_eq!(trend.direction, TrendDirection::Increasing);
        assert_relative_eq!(trend.predict(date(2021, 1, 11)), 120.0, epsilon = 1e-9);
    }

    #[test]
    fn test_decreasing_irregular_spacing() {
        let s = series(&[
            (date(2020, 1, 1), 50.0),
            (date(2020, 1, 11), 40.0),
            (date(2020, 2, 10), 10.0),
        ]);
        let trend = linear_trend(&s, &TrendParams::default()).unwrap();

        assert_relative_eq!(trend.slope_per_day, -1.0, epsilon = 1e-10);
        assert_eq!(trend.direction, TrendDirection::Decreasing);
        assert_relative_eq!(trend.r_squared, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_series_is_stable() {
        let s = daily_series(|_| 42.0, 5);
        let trend = linear_trend(&s, &TrendParams::default()).unwrap();

        assert_eq!(trend.slope_per_year, 0.0);
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert_eq!(trend.r_squared, 1.0);
    }

    #[test]
    fn test_epsilon_controls_stable_label() {
        let s = daily_series(|i| 10.0 + 0.001 * i as f64, 5);
        let strict = linear_trend(&s, &TrendParams::default()).unwrap();
        assert_eq!(strict.direction, TrendDirection::Increasing);

        let loose = linear_trend(&s, &TrendParams { stable_epsilon: 1.0 }).unwrap();
        assert_eq!(loose.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_noisy_fit_has_partial_r_squared() {
        let s = daily_series(|i| i as f64 + if i % 2 == 0 { 1.0 } else { -1.0 }, 8);
        let trend = linear_trend(&s, &TrendParams::default()).unwrap();
        assert!(trend.r_squared > 0.0 && trend.r_squared < 1.0);
    }

    #[test]
    fn test_single_observation_is_insufficient() {
        let s = series(&[(date(2020, 1, 1), 1.0)]);
        assert_eq!(
            linear_trend(&s, &TrendParams::default()),
            Err(Error::InsufficientData { required: 2, found: 1 })
        );
    }
}
