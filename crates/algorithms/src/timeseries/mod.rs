//! Water-area time-series analytics
//!
//! Analysis of dated water-area observations:
//! - **summary**: Descriptive statistics (mean, median, std, extremes)
//! - **trend**: Least-squares linear trend with direction label
//! - **seasonal**: Per-month and per-season aggregation
//! - **resample**: Monthly / yearly mean resampling
//! - **anomaly**: Z-score anomaly flags
//!
//! Every operation is a pure function of a [`TimeSeries`]; nothing is cached
//! between calls and the input series is never modified.

mod anomaly;
mod resample;
mod seasonal;
mod stats;
mod summary;
mod trend;

pub use anomaly::{
    anomalies, score_observations, AnomalyKind, AnomalyParams, ScoredObservation, ZScoreBaseline,
};
pub use resample::{resample, Frequency};
pub use seasonal::{
    seasonal_summary, Hemisphere, MonthGroup, Season, SeasonConfig, SeasonGroup, SeasonalTable,
};
pub use stats::GroupStats;
pub use summary::{describe, SeriesSummary};
pub use trend::{linear_trend, TrendDirection, TrendParams, TrendResult};

use chrono::NaiveDate;
use lakewatch_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// One dated water-area observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaMeasurement {
    pub date: NaiveDate,
    pub area_km2: f64,
    /// Pixel edge length (meters) the area was converted with, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_size_m: Option<f64>,
}

impl AreaMeasurement {
    pub fn new(date: NaiveDate, area_km2: f64) -> Self {
        Self {
            date,
            area_km2,
            pixel_size_m: None,
        }
    }

    pub fn with_pixel_size(date: NaiveDate, area_km2: f64, pixel_size_m: f64) -> Self {
        Self {
            date,
            area_km2,
            pixel_size_m: Some(pixel_size_m),
        }
    }
}

/// Observations ordered by strictly increasing date.
///
/// Construction rejects out-of-order and duplicate dates with
/// [`Error::UnorderedTimestamps`], and negative or non-finite areas with
/// [`Error::InvalidParameter`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    observations: Vec<AreaMeasurement>,
}

impl TimeSeries {
    /// Wrap observations that are already in strictly increasing date order
    pub fn new(observations: Vec<AreaMeasurement>) -> Result<Self> {
        if let Some(bad) = observations
            .iter()
            .find(|o| !(o.area_km2.is_finite() && o.area_km2 >= 0.0))
        {
            return Err(Error::InvalidParameter {
                name: "area_km2",
                value: bad.area_km2.to_string(),
                reason: format!("area observed on {} must be finite and >= 0", bad.date),
            });
        }
        for pair in observations.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(Error::UnorderedTimestamps {
                    previous: pair[0].date.to_string(),
                    next: pair[1].date.to_string(),
                });
            }
        }
        Ok(Self { observations })
    }

    /// Sort observations by date first; duplicate dates are still rejected
    pub fn from_unsorted(mut observations: Vec<AreaMeasurement>) -> Result<Self> {
        observations.sort_by_key(|o| o.date);
        Self::new(observations)
    }

    pub fn observations(&self) -> &[AreaMeasurement] {
        &self.observations
    }

    pub fn iter(&self) -> impl Iterator<Item = &AreaMeasurement> {
        self.observations.iter()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first(&self) -> Option<&AreaMeasurement> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&AreaMeasurement> {
        self.observations.last()
    }

    /// Areas in date order
    pub fn areas(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.area_km2).collect()
    }

    /// Difference between each pair of consecutive observations
    pub fn changes(&self) -> Vec<ObservationChange> {
        self.observations
            .windows(2)
            .map(|pair| {
                let delta_km2 = pair[1].area_km2 - pair[0].area_km2;
                ObservationChange {
                    from: pair[0].date,
                    to: pair[1].date,
                    delta_km2,
                    percent: (pair[0].area_km2 != 0.0)
                        .then(|| delta_km2 / pair[0].area_km2 * 100.0),
                }
            })
            .collect()
    }
}

/// Change in area between two consecutive observations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationChange {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub delta_km2: f64,
    /// Relative change; `None` when the earlier area is zero
    pub percent: Option<f64>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn series(points: &[(NaiveDate, f64)]) -> TimeSeries {
        TimeSeries::new(
            points
                .iter()
                .map(|&(d, a)| AreaMeasurement::new(d, a))
                .collect(),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{date, series};
    use super::*;

    #[test]
    fn test_rejects_duplicate_dates() {
        let obs = vec![
            AreaMeasurement::new(date(2020, 1, 1), 1.0),
            AreaMeasurement::new(date(2020, 1, 1), 2.0),
        ];
        assert!(matches!(
            TimeSeries::new(obs),
            Err(Error::UnorderedTimestamps { .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_order() {
        let obs = vec![
            AreaMeasurement::new(date(2020, 2, 1), 1.0),
            AreaMeasurement::new(date(2020, 1, 1), 2.0),
        ];
        assert!(TimeSeries::new(obs.clone()).is_err());

        let sorted = TimeSeries::from_unsorted(obs).unwrap();
        assert_eq!(sorted.first().unwrap().date, date(2020, 1, 1));
    }

    #[test]
    fn test_rejects_invalid_areas() {
        for area in [-5.0, f64::NAN, f64::INFINITY] {
            let obs = vec![
                AreaMeasurement::new(date(2020, 1, 1), 3.0),
                AreaMeasurement::new(date(2020, 2, 1), area),
            ];
            assert!(
                matches!(
                    TimeSeries::new(obs.clone()),
                    Err(Error::InvalidParameter { name: "area_km2", .. })
                ),
                "area {} accepted",
                area
            );
            assert!(TimeSeries::from_unsorted(obs).is_err());
        }

        let zero = vec![AreaMeasurement::new(date(2020, 1, 1), 0.0)];
        assert!(TimeSeries::new(zero).is_ok());
    }

    #[test]
    fn test_changes() {
        let s = series(&[
            (date(2020, 1, 1), 0.0),
            (date(2020, 2, 1), 10.0),
            (date(2020, 3, 1), 5.0),
        ]);

        let changes = s.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].delta_km2, 10.0);
        assert_eq!(changes[0].percent, None);
        assert_eq!(changes[1].delta_km2, -5.0);
        assert_eq!(changes[1].percent, Some(-50.0));
    }
}
