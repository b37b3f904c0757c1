//! Calendar resampling of a water-area series

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::stats::mean;
use super::{AreaMeasurement, TimeSeries};
use lakewatch_core::{Error, Result};

/// Resampling period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One sample per (year, month), dated the first of the month
    Monthly,
    /// One sample per year, dated January 1st
    Yearly,
}

/// Mean area per calendar period.
///
/// Periods without observations produce no sample. The pixel size is kept
/// when every observation in the period shares it. An empty series
/// resamples to an empty series.
pub fn resample(series: &TimeSeries, frequency: Frequency) -> Result<TimeSeries> {
    let mut groups: BTreeMap<(i32, u32), Vec<&AreaMeasurement>> = BTreeMap::new();
    for o in series.iter() {
        let key = match frequency {
            Frequency::Monthly => (o.date.year(), o.date.month()),
            Frequency::Yearly => (o.date.year(), 1),
        };
        groups.entry(key).or_default().push(o);
    }

    let samples = groups
        .into_iter()
        .map(|((year, month), members)| {
            let date = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| Error::Other(format!("invalid period {}-{:02}", year, month)))?;
            let areas: Vec<f64> = members.iter().map(|o| o.area_km2).collect();
            let area_km2 = mean(&areas).ok_or(Error::EmptySeries)?;

            let pixel_size_m = members[0].pixel_size_m;
            let shared = members.iter().all(|o| o.pixel_size_m == pixel_size_m);

            Ok(AreaMeasurement {
                date,
                area_km2,
                pixel_size_m: if shared { pixel_size_m } else { None },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    TimeSeries::new(samples)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{date, series};
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> TimeSeries {
        series(&[
            (date(2020, 1, 5), 10.0),
            (date(2020, 1, 20), 20.0),
            (date(2020, 3, 2), 30.0),
            (date(2021, 3, 9), 50.0),
        ])
    }

    #[test]
    fn test_monthly() {
        let monthly = resample(&sample(), Frequency::Monthly).unwrap();
        let obs = monthly.observations();

        assert_eq!(obs.len(), 3);
        assert_eq!(obs[0].date, date(2020, 1, 1));
        assert_relative_eq!(obs[0].area_km2, 15.0);
        assert_eq!(obs[1].date, date(2020, 3, 1));
        assert_eq!(obs[2].date, date(2021, 3, 1));
    }

    #[test]
    fn test_yearly() {
        let yearly = resample(&sample(), Frequency::Yearly).unwrap();
        let obs = yearly.observations();

        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].date, date(2020, 1, 1));
        assert_relative_eq!(obs[0].area_km2, 20.0);
        assert_relative_eq!(obs[1].area_km2, 50.0);
    }

    #[test]
    fn test_pixel_size_kept_when_shared() {
        let s = TimeSeries::new(vec![
            AreaMeasurement::with_pixel_size(date(2020, 1, 1), 1.0, 30.0),
            AreaMeasurement::with_pixel_size(date(2020, 1, 9), 2.0, 30.0),
            AreaMeasurement::with_pixel_size(date(2020, 2, 1), 1.0, 30.0),
            AreaMeasurement::with_pixel_size(date(2020, 2, 9), 2.0, 10.0),
        ])
        .unwrap();

        let monthly = resample(&s, Frequency::Monthly).unwrap();
        assert_eq!(monthly.observations()[0].pixel_size_m, Some(30.0));
        assert_eq!(monthly.observations()[1].pixel_size_m, None);
    }

    #[test]
    fn test_empty() {
        let out = resample(&TimeSeries::default(), Frequency::Monthly).unwrap();
        assert!(out.is_empty());
    }
}
