//! LakeWatch CLI - Lake water extent monitoring

mod series_input;
mod synthetic;

use anyhow::{Context, Result};
use chrono::{Months, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use lakewatch_algorithms::config::AnalysisConfig;
use lakewatch_algorithms::imagery::{
    compare_multiple, compute_index, extract_mask_or, ChangeStats, IndexKind, ThresholdMethod,
    WaterMask,
};
use lakewatch_algorithms::timeseries::{
    describe, linear_trend, score_observations, seasonal_summary, AnomalyKind, ObservationChange,
    ScoredObservation, SeasonalTable, SeriesSummary, TimeSeries, TrendResult,
};

use crate::synthetic::{lake_scene, SceneParams};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lakewatch")]
#[command(author, version, about = "Lake water extent monitoring", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map water in synthetic scenes of a changing lake
    Scene {
        /// Scene edge length in pixels
        #[arg(long, default_value = "64")]
        size: usize,
        /// Lake radius in pixels for each date, one month apart
        #[arg(long, value_delimiter = ',', default_value = "20,16,12")]
        radii: Vec<f64>,
        /// Water index formula (overrides the config file)
        #[arg(long)]
        index: Option<IndexArg>,
        /// Use Otsu's automatic threshold (overrides the config file)
        #[arg(long)]
        otsu: bool,
        /// Seed for the pseudo-random reflectance noise
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Analysis configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyze a water-area time series
    Series {
        /// Input file with `date,area_km2` lines
        input: PathBuf,
        /// Analysis configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum IndexArg {
    Ndwi,
    Mndwi,
}

impl From<IndexArg> for IndexKind {
    fn from(arg: IndexArg) -> Self {
        match arg {
            IndexArg::Ndwi => IndexKind::Ndwi,
            IndexArg::Mndwi => IndexKind::Mndwi,
        }
    }
}

// ─── Reports ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SceneDate {
    date: NaiveDate,
    threshold: Option<f64>,
    water_pixels: usize,
    area_km2: f64,
}

#[derive(Serialize)]
struct SceneChange {
    from: NaiveDate,
    to: NaiveDate,
    stats: ChangeStats,
}

#[derive(Serialize)]
struct SceneReport {
    index: IndexKind,
    pixel_size_m: f64,
    dates: Vec<SceneDate>,
    changes: Vec<SceneChange>,
    max_area_km2: f64,
    min_area_km2: f64,
}

#[derive(Serialize)]
struct SeriesReport {
    summary: SeriesSummary,
    trend: Option<TrendResult>,
    changes: Vec<ObservationChange>,
    seasonal: SeasonalTable,
    anomalies: Vec<ScoredObservation>,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to encode report")?;
    println!("{}", text);
    Ok(())
}

fn anomaly_label(kind: Option<AnomalyKind>) -> &'static str {
    match kind {
        Some(AnomalyKind::High) => "high",
        Some(AnomalyKind::Low) => "low",
        None => "",
    }
}

// ─── Commands ───────────────────────────────────────────────────────────

fn run_scene(
    size: usize,
    radii: &[f64],
    config: &AnalysisConfig,
    seed: u64,
) -> Result<SceneReport> {
    anyhow::ensure!(size > 0, "Scene size must be positive");
    anyhow::ensure!(radii.len() >= 2, "Need at least two radii to compare dates");

    let start = NaiveDate::from_ymd_opt(2020, 1, 1).context("Invalid start date")?;
    let pb = spinner("Mapping water...");

    let mut masks: Vec<WaterMask> = Vec::with_capacity(radii.len());
    let mut dates = Vec::with_capacity(radii.len());
    for (i, &radius) in radii.iter().enumerate() {
        let date = start
            .checked_add_months(Months::new(i as u32))
            .context("Date out of range")?;
        let bands = lake_scene(&SceneParams {
            size,
            lake_radius: radius,
            pixel_size_m: config.pixel_size_m,
            seed: seed.wrapping_add(i as u64),
        })?;
        let index = compute_index(bands.water_index(config.index)?)?;
        let mask = extract_mask_or(&index, config.threshold, config.fallback_threshold)?;
        debug!(%date, radius, water_pixels = mask.water_pixels(), "scene mapped");
        masks.push(mask);
        dates.push(date);
    }

    let report = compare_multiple(&masks, &dates, config.pixel_size_m)
        .context("Change detection failed")?;
    pb.finish_and_clear();

    Ok(SceneReport {
        index: config.index,
        pixel_size_m: config.pixel_size_m,
        dates: masks
            .iter()
            .zip(&report.areas)
            .map(|(mask, area)| SceneDate {
                date: area.date,
                threshold: mask.threshold(),
                water_pixels: mask.water_pixels(),
                area_km2: area.area_km2,
            })
            .collect(),
        changes: report
            .changes
            .iter()
            .map(|c| SceneChange {
                from: c.from,
                to: c.to,
                stats: c.stats,
            })
            .collect(),
        max_area_km2: report.max_area_km2,
        min_area_km2: report.min_area_km2,
    })
}

fn print_scene(report: &SceneReport) {
    println!(
        "Index: {:?}  Pixel size: {} m",
        report.index, report.pixel_size_m
    );
    println!();
    println!("  {:<12} {:>10} {:>8} {:>10}", "date", "threshold", "pixels", "area_km2");
    for d in &report.dates {
        let threshold = d
            .threshold
            .map(|t| format!("{:.4}", t))
            .unwrap_or_else(|| "-".into());
        println!(
            "  {:<12} {:>10} {:>8} {:>10.4}",
            d.date, threshold, d.water_pixels, d.area_km2
        );
    }
    println!();
    for c in &report.changes {
        let s = &c.stats;
        println!("{} -> {}", c.from, c.to);
        println!(
            "  stable water:     {:>7} ({:.2}%)",
            s.stable_water.pixels, s.stable_water.percent
        );
        println!(
            "  stable non-water: {:>7} ({:.2}%)",
            s.stable_non_water.pixels, s.stable_non_water.percent
        );
        println!(
            "  water loss:       {:>7} ({:.2}%)",
            s.water_loss.pixels, s.water_loss.percent
        );
        println!(
            "  water gain:       {:>7} ({:.2}%)",
            s.water_gain.pixels, s.water_gain.percent
        );
        println!(
            "  net change:       {:>7} ({:+.2}%)",
            s.net_change_pixels, s.net_change_percent
        );
    }
    println!();
    println!("Maximum extent: {:.4} km2", report.max_area_km2);
    println!("Minimum extent: {:.4} km2", report.min_area_km2);
}

fn run_series(series: &TimeSeries, config: &AnalysisConfig) -> Result<SeriesReport> {
    let summary = describe(series).context("Cannot summarize series")?;
    let trend = if series.len() >= 2 {
        Some(linear_trend(series, &config.trend)?)
    } else {
        warn!("Trend needs at least two observations; skipping");
        None
    };
    let seasonal = seasonal_summary(series, &config.season_config())?;
    let anomalies = score_observations(series, &config.anomaly)?
        .into_iter()
        .filter(|o| o.anomaly.is_some())
        .collect();

    Ok(SeriesReport {
        summary,
        trend,
        changes: series.changes(),
        seasonal,
        anomalies,
    })
}

fn print_series(report: &SeriesReport) {
    let s = &report.summary;
    println!("Observations: {} ({} to {})", s.count, s.first_date, s.last_date);
    println!("  Mean:    {:.4} km2", s.mean);
    println!("  Median:  {:.4} km2", s.median);
    println!("  Std dev: {:.4} km2", s.std_dev);
    println!("  Min:     {:.4} km2 on {}", s.min_area_km2, s.min_date);
    println!("  Max:     {:.4} km2 on {}", s.max_area_km2, s.max_date);

    if let Some(t) = &report.trend {
        println!();
        println!(
            "Trend: {} ({:+.4} km2/year, R2 = {:.4})",
            t.direction.label(),
            t.slope_per_year,
            t.r_squared
        );
    }

    println!();
    println!("  {:<8} {:>5} {:>10} {:>10} {:>10}", "month", "n", "mean", "median", "std");
    for m in &report.seasonal.by_month {
        println!(
            "  {:<8} {:>5} {:>10.4} {:>10.4} {:>10.4}",
            m.month, m.stats.count, m.stats.mean, m.stats.median, m.stats.std_dev
        );
    }
    println!();
    println!("  {:<8} {:>5} {:>10} {:>10} {:>10}", "season", "n", "mean", "median", "std");
    for g in &report.seasonal.by_season {
        println!(
            "  {:<8} {:>5} {:>10.4} {:>10.4} {:>10.4}",
            g.season.label(),
            g.stats.count,
            g.stats.mean,
            g.stats.median,
            g.stats.std_dev
        );
    }

    println!();
    if report.anomalies.is_empty() {
        println!("No anomalies");
    } else {
        println!("Anomalies:");
        for a in &report.anomalies {
            println!(
                "  {}  {:.4} km2  z = {:+.2}  {}",
                a.date,
                a.area_km2,
                a.z_score,
                anomaly_label(a.anomaly)
            );
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Scene {
            size,
            radii,
            index,
            otsu,
            seed,
            config,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(index) = index {
                config.index = index.into();
            }
            if otsu {
                config.threshold = ThresholdMethod::otsu();
            }

            let start = Instant::now();
            let report = run_scene(size, &radii, &config, seed)?;
            info!("Processed {} scenes in {:.2?}", radii.len(), start.elapsed());

            if json {
                print_json(&report)?;
            } else {
                print_scene(&report);
            }
        }

        Commands::Series {
            input,
            config,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            let series = series_input::read_series(&input)?;
            info!("Loaded {} observations from {}", series.len(), input.display());

            let report = run_series(&series, &config)?;
            if json {
                print_json(&report)?;
            } else {
                print_series(&report);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakewatch_algorithms::timeseries::AreaMeasurement;

    fn obs(y: i32, m: u32, area: f64) -> AreaMeasurement {
        AreaMeasurement::new(NaiveDate::from_ymd_opt(y, m, 1).unwrap(), area)
    }

    #[test]
    fn test_cli_parses_radii() {
        let cli = Cli::try_parse_from(["lakewatch", "scene", "--radii", "10,8,6", "--otsu"]).unwrap();
        match cli.command {
            Commands::Scene { radii, otsu, .. } => {
                assert_eq!(radii, vec![10.0, 8.0, 6.0]);
                assert!(otsu);
            }
            _ => panic!("expected scene command"),
        }
    }

    #[test]
    fn test_shrinking_scene_loses_water() {
        let report = run_scene(48, &[16.0, 10.0], &AnalysisConfig::default(), 3).unwrap();

        assert_eq!(report.dates.len(), 2);
        assert!(report.dates[0].area_km2 > report.dates[1].area_km2);
        let stats = &report.changes[0].stats;
        assert!(stats.water_loss.pixels > 0);
        assert_eq!(stats.water_gain.pixels, 0);
        assert!((report.max_area_km2 - report.dates[0].area_km2).abs() < 1e-12);
        assert!((report.min_area_km2 - report.dates[1].area_km2).abs() < 1e-12);
    }

    #[test]
    fn test_scene_needs_two_dates() {
        assert!(run_scene(32, &[8.0], &AnalysisConfig::default(), 0).is_err());
    }

    #[test]
    fn test_series_report() {
        let series = TimeSeries::new(vec![
            obs(2020, 1, 10.0),
            obs(2020, 4, 11.0),
            obs(2020, 7, 12.0),
            obs(2020, 10, 13.0),
        ])
        .unwrap();

        let report = run_series(&series, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.summary.count, 4);
        assert!(report.trend.is_some());
        assert_eq!(report.changes.len(), 3);
        assert_eq!(report.seasonal.by_month.len(), 4);
        assert!(report.anomalies.is_empty());
    }
}
