//! Reading `date,area_km2` observation lists

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use lakewatch_algorithms::timeseries::{AreaMeasurement, TimeSeries};

/// Parse one observation per line: `YYYY-MM-DD,area_km2`.
///
/// Blank lines, `#` comments and a leading header line are skipped.
/// Observations may appear in any order; duplicate dates are an error.
pub fn parse_series(text: &str) -> Result<TimeSeries> {
    let mut observations = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((date, area)) = line.split_once(',') else {
            bail!("line {}: expected `date,area_km2`, got {:?}", lineno + 1, line);
        };
        let date = match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) if observations.is_empty() && area.trim().parse::<f64>().is_err() => continue,
            Err(e) => bail!("line {}: bad date {:?}: {}", lineno + 1, date, e),
        };
        let area: f64 = area
            .trim()
            .parse()
            .with_context(|| format!("line {}: bad area {:?}", lineno + 1, area))?;
        if !area.is_finite() {
            bail!("line {}: area must be a finite number, got {}", lineno + 1, area);
        }
        if area < 0.0 {
            bail!("line {}: negative area {}", lineno + 1, area);
        }
        observations.push(AreaMeasurement::new(date, area));
    }
    TimeSeries::from_unsorted(observations).context("invalid observation dates")
}

pub fn read_series(path: &Path) -> Result<TimeSeries> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_series(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_header_and_comments() {
        let text = "date,area_km2\n# wet season\n2020-03-01, 12.5\n\n2020-01-01,10\n";
        let series = parse_series(text).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().area_km2, 10.0);
        assert_eq!(series.last().unwrap().area_km2, 12.5);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_series("2020-01-01;4").is_err());
        assert!(parse_series("2020-01-01,abc").is_err());
        assert!(parse_series("2020-01-01,-1").is_err());
        assert!(parse_series("2020-01-01,NaN").is_err());
        assert!(parse_series("2020-01-01,inf").is_err());
        assert!(parse_series("2020-01-01,1\n2020-01-01,2").is_err());
        assert!(parse_series("2020-01-01,1\n2020-13-01,2").is_err());
    }
}
