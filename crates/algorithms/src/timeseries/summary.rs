//! Descriptive statistics of a water-area series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::stats::{mean, median, std_dev};
use super::TimeSeries;
use lakewatch_core::{Error, Result};

/// Summary of a whole series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min_area_km2: f64,
    pub min_date: NaiveDate,
    pub max_area_km2: f64,
    pub max_date: NaiveDate,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// Descriptive statistics over every observation.
///
/// When the extreme value occurs more than once, the earliest date is
/// reported. Fails with [`Error::EmptySeries`] for an empty series.
pub fn describe(series: &TimeSeries) -> Result<SeriesSummary> {
    let obs = series.observations();
    let (first, last) = match (obs.first(), obs.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(Error::EmptySeries),
    };

    let areas = series.areas();
    let mean = mean(&areas).ok_or(Error::EmptySeries)?;
    let median = median(&areas).ok_or(Error::EmptySeries)?;

    let mut min = first;
    let mut max = first;
    for o in obs {
        if o.area_km2 < min.area_km2 {
            min = o;
        }
        if o.area_km2 > max.area_km2 {
            max = o;
        }
    }

    Ok(SeriesSummary {
        count: obs.len(),
        mean,
        median,
        std_dev: std_dev(&areas, mean),
        min_area_km2: min.area_km2,
        min_date: min.date,
        max_area_km2: max.area_km2,
        max_date: max.date,
        first_date: first.date,
        last_date: last.date,
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{date, series};
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_describe() {
        let s = series(&[
            (date(2020, 1, 1), 12.0),
            (date(2020, 2, 1), 8.0),
            (date(2020, 3, 1), 15.0),
            (date(2020, 4, 1), 9.0),
        ]);

        let summary = describe(&s).unwrap();
        assert_eq!(summary.count, 4);
        assert_relative_eq!(summary.mean, 11.0);
        assert_relative_eq!(summary.median, 10.5);
        assert_relative_eq!(summary.std_dev, 7.5_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(summary.min_area_km2, 8.0);
        assert_eq!(summary.min_date, date(2020, 2, 1));
        assert_eq!(summary.max_area_km2, 15.0);
        assert_eq!(summary.max_date, date(2020, 3, 1));
    }

    #[test]
    fn test_describe_ties_keep_earliest() {
        let s = series(&[(date(2020, 1, 1), 5.0), (date(2020, 2, 1), 5.0)]);
        let summary = describe(&s).unwrap();
        assert_eq!(summary.min_date, date(2020, 1, 1));
        assert_eq!(summary.max_date, date(2020, 1, 1));
        assert_eq!(summary.std_dev, 0.0);
    }

    #[test]
    fn test_describe_empty() {
        assert_eq!(describe(&TimeSeries::default()), Err(Error::EmptySeries));
    }
}
