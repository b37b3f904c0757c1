//! Shared descriptive statistics over area values.
//!
//! Standard deviation is the population form (divides by `n`), matching
//! the convention used for z-scores.

use serde::{Deserialize, Serialize};

/// Count, mean, median and standard deviation of a group of areas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl GroupStats {
    /// `None` for an empty group
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        Some(Self {
            count: values.len(),
            mean,
            median: median(values)?,
            std_dev: std_dev(values, mean),
        })
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    Some(if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    })
}

pub(crate) fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
