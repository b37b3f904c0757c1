//! Z-score anomaly detection
//!
//! Each observation is scored `z = (value - mean) / std` and flagged when
//! `|z|` exceeds the threshold. A series with zero standard deviation has
//! no anomalies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::stats::{mean, std_dev};
use super::TimeSeries;
use lakewatch_core::{Error, Result};

/// Which observations the mean and standard deviation are taken over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZScoreBaseline {
    /// Mean and std of the whole series, including the scored observation
    #[default]
    FullSeries,
    /// Mean and std of every other observation.
    ///
    /// A single outlier inflates the full-series std enough that its own
    /// z-score is bounded by `(n - 1) / sqrt(n)`; excluding it from its own
    /// baseline lets short series flag it. A deviation from a constant
    /// remainder scores an infinite z.
    LeaveOneOut,
}

/// Parameters for anomaly detection.
///
/// With the default [`ZScoreBaseline::FullSeries`] no observation of an
/// `n`-point series can score above `(n - 1) / sqrt(n)`. Four monthly areas
/// `[100, 100, 100, 400]` give the last one `z = sqrt(3) ≈ 1.73`, which the
/// default `z_threshold` of 2.0 does not flag; use
/// [`ZScoreBaseline::LeaveOneOut`] or a lower threshold for such short series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyParams {
    /// Observations with `|z|` strictly above this are anomalies
    pub z_threshold: f64,
    pub baseline: ZScoreBaseline,
}

impl Default for AnomalyParams {
    fn default() -> Self {
        Self {
            z_threshold: 2.0,
            baseline: ZScoreBaseline::FullSeries,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    /// Area unusually large (z > 0)
    High,
    /// Area unusually small (z < 0)
    Low,
}

/// An observation with its z-score and anomaly flag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredObservation {
    pub date: NaiveDate,
    pub area_km2: f64,
    pub z_score: f64,
    pub anomaly: Option<AnomalyKind>,
}

/// Score every observation of the series, in date order.
///
/// Fails with [`Error::EmptySeries`] for an empty series and with
/// [`Error::InvalidParameter`] for a negative or non-finite threshold.
pub fn score_observations(
    series: &TimeSeries,
    params: &AnomalyParams,
) -> Result<Vec<ScoredObservation>> {
    if !(params.z_threshold.is_finite() && params.z_threshold >= 0.0) {
        return Err(Error::InvalidParameter {
            name: "z_threshold",
            value: params.z_threshold.to_string(),
            reason: "must be a finite, non-negative number".into(),
        });
    }

    let areas = series.areas();
    let series_mean = mean(&areas).ok_or(Error::EmptySeries)?;
    let series_std = std_dev(&areas, series_mean);
    let degenerate = series_std == 0.0;

    let scored = series
        .iter()
        .enumerate()
        .map(|(i, o)| {
            let z_score = if degenerate {
                0.0
            } else {
                match params.baseline {
                    ZScoreBaseline::FullSeries => (o.area_km2 - series_mean) / series_std,
                    ZScoreBaseline::LeaveOneOut => leave_one_out_z(&areas, i),
                }
            };
            let anomaly = if z_score.abs() > params.z_threshold {
                Some(if z_score > 0.0 {
                    AnomalyKind::High
                } else {
                    AnomalyKind::Low
                })
            } else {
                None
            };
            ScoredObservation {
                date: o.date,
                area_km2: o.area_km2,
                z_score,
                anomaly,
            }
        })
        .collect();

    Ok(scored)
}

/// Only the flagged observations of [`score_observations`]
pub fn anomalies(series: &TimeSeries, params: &AnomalyParams) -> Result<Vec<ScoredObservation>> {
    Ok(score_observations(series, params)?
        .into_iter()
        .filter(|s| s.anomaly.is_some())
        .collect())
}

fn leave_one_out_z(areas: &[f64], index: usize) -> f64 {
    let others: Vec<f64> = areas
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != index)
        .map(|(_, &v)| v)
        .collect();
    let Some(m) = mean(&others) else {
        return 0.0;
    };
    let deviation = areas[index] - m;
    let s = std_dev(&others, m);
    if s == 0.0 {
        if deviation == 0.0 {
            0.0
        } else {
            deviation.signum() * f64::INFINITY
        }
    } else {
        deviation / s
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{date, series};
    use super::*;
    use approx::assert_relative_eq;

    fn spring_flood() -> TimeSeries {
        series(&[
            (date(2022, 1, 1), 100.0),
            (date(2022, 2, 1), 100.0),
            (date(2022, 3, 1), 100.0),
            (date(2022, 4, 1), 400.0),
        ])
    }

    #[test]
    fn test_full_series_z_scores() {
        let scored = score_observations(&spring_flood(), &AnomalyParams::default()).unwrap();

        // mean 175, population std sqrt(16875)
        let std = 16875.0_f64.sqrt();
        assert_relative_eq!(scored[0].z_score, -75.0 / std, epsilon = 1e-12);
        assert_relative_eq!(scored[3].z_score, 3.0_f64.sqrt(), epsilon = 1e-12);
        // sqrt(3) < 2.0: a lone outlier in four points cannot reach the default threshold
        assert!(scored.iter().all(|s| s.anomaly.is_none()));

        let lowered = AnomalyParams {
            z_threshold: 1.5,
            ..AnomalyParams::default()
        };
        let flagged = anomalies(&spring_flood(), &lowered).unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].date, date(2022, 4, 1));
        assert_eq!(flagged[0].anomaly, Some(AnomalyKind::High));
    }

    #[test]
    fn test_leave_one_out_flags_april_high() {
        let params = AnomalyParams {
            z_threshold: 2.0,
            baseline: ZScoreBaseline::LeaveOneOut,
        };
        let scored = score_observations(&spring_flood(), &params).unwrap();

        for s in &scored[..3] {
            assert!(s.anomaly.is_none(), "{} should not be flagged", s.date);
        }
        assert_eq!(scored[3].anomaly, Some(AnomalyKind::High));
        assert!(scored[3].z_score.is_infinite());
    }

    #[test]
    fn test_low_anomaly() {
        let mut points: Vec<(NaiveDate, f64)> =
            (1..=10).map(|m| (date(2020, m, 1), 50.0)).collect();
        points.push((date(2020, 11, 1), 5.0));
        let s = series(&points);

        let flagged = anomalies(&s, &AnomalyParams::default()).unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].anomaly, Some(AnomalyKind::Low));
        assert!(flagged[0].z_score < -2.0);
    }

    #[test]
    fn test_constant_series_has_no_anomalies() {
        let s = series(&[
            (date(2020, 1, 1), 7.0),
            (date(2020, 2, 1), 7.0),
            (date(2020, 3, 1), 7.0),
        ]);
        for threshold in [0.0, 0.5, 2.0] {
            for baseline in [ZScoreBaseline::FullSeries, ZScoreBaseline::LeaveOneOut] {
                let params = AnomalyParams {
                    z_threshold: threshold,
                    baseline,
                };
                assert!(anomalies(&s, &params).unwrap().is_empty());
            }
        }
    }

    #[test]
    fn test_empty_and_invalid() {
        assert_eq!(
            score_observations(&TimeSeries::default(), &AnomalyParams::default()),
            Err(Error::EmptySeries)
        );
        let bad = AnomalyParams {
            z_threshold: -1.0,
            ..AnomalyParams::default()
        };
        assert!(matches!(
            anomalies(&spring_flood(), &bad),
            Err(Error::InvalidParameter { name: "z_threshold", .. })
        ));
    }
}
