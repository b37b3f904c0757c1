//! Seasonal aggregation
//!
//! Observations are grouped by calendar month and by meteorological
//! season. The month→season mapping is a [`SeasonConfig`] table so the
//! southern hemisphere (or any custom grouping) can be used.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::stats::GroupStats;
use super::TimeSeries;
use lakewatch_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn label(self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    #[default]
    Northern,
    Southern,
}

/// Month → season lookup table, indexed January first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonConfig {
    months: [Season; 12],
}

impl SeasonConfig {
    /// Dec–Feb winter, Mar–May spring, Jun–Aug summer, Sep–Nov autumn
    pub fn northern() -> Self {
        use Season::*;
        Self {
            months: [
                Winter, Winter, Spring, Spring, Spring, Summer, Summer, Summer, Autumn, Autumn,
                Autumn, Winter,
            ],
        }
    }

    /// Dec–Feb summer, Mar–May autumn, Jun–Aug winter, Sep–Nov spring
    pub fn southern() -> Self {
        use Season::*;
        Self {
            months: [
                Summer, Summer, Autumn, Autumn, Autumn, Winter, Winter, Winter, Spring, Spring,
                Spring, Summer,
            ],
        }
    }

    pub fn for_hemisphere(hemisphere: Hemisphere) -> Self {
        match hemisphere {
            Hemisphere::Northern => Self::northern(),
            Hemisphere::Southern => Self::southern(),
        }
    }

    /// Custom table, `months[0]` is January
    pub fn from_months(months: [Season; 12]) -> Self {
        Self { months }
    }

    /// Season of a 1-based month number
    pub fn season_of(&self, month: u32) -> Option<Season> {
        let idx = usize::try_from(month).ok()?.checked_sub(1)?;
        self.months.get(idx).copied()
    }
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self::northern()
    }
}

/// Statistics for one calendar month across all years
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthGroup {
    /// 1 = January
    pub month: u32,
    pub stats: GroupStats,
}

/// Statistics for one season across all years
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonGroup {
    pub season: Season,
    pub stats: GroupStats,
}

/// Per-month and per-season aggregates; groups with no observations are
/// omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTable {
    /// Ascending by month
    pub by_month: Vec<MonthGroup>,
    /// Winter, spring, summer, autumn order
    pub by_season: Vec<SeasonGroup>,
}

impl SeasonalTable {
    pub fn month(&self, month: u32) -> Option<&MonthGroup> {
        self.by_month.iter().find(|g| g.month == month)
    }

    pub fn season(&self, season: Season) -> Option<&SeasonGroup> {
        self.by_season.iter().find(|g| g.season == season)
    }
}

/// Group observations by calendar month and season.
///
/// Fails with [`Error::EmptySeries`] for an empty series.
pub fn seasonal_summary(series: &TimeSeries, config: &SeasonConfig) -> Result<SeasonalTable> {
    if series.is_empty() {
        return Err(Error::EmptySeries);
    }

    let mut months: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    let mut seasons: BTreeMap<Season, Vec<f64>> = BTreeMap::new();

    for o in series.iter() {
        let month = o.date.month();
        months.entry(month).or_default().push(o.area_km2);
        if let Some(season) = config.season_of(month) {
            seasons.entry(season).or_default().push(o.area_km2);
        }
    }

    let by_month = months
        .into_iter()
        .filter_map(|(month, values)| {
            GroupStats::from_values(&values).map(|stats| MonthGroup { month, stats })
        })
        .collect();
    let by_season = seasons
        .into_iter()
        .filter_map(|(season, values)| {
            GroupStats::from_values(&values).map(|stats| SeasonGroup { season, stats })
        })
        .collect();

    Ok(SeasonalTable {
        by_month,
        by_season,
    })
}
