//! Shared sampling/statistics helpers, generalized from the donor's
//! `monte_carlo/simulation.rs` (`sample`, `percentile_sorted`,
//! `build_histogram`, `compute_statistics`) to the two consumers in this
//! crate: [`crate::monte_carlo::cvar`] and
//! [`crate::monte_carlo::npv_uncertainty`].

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use crate::error::AtlasError;

/// Sample one draw from a normal distribution, floored at `floor` if given.
pub fn sample_normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> Result<f64, AtlasError> {
    let dist = Normal::new(mean, std_dev).map_err(|e| {
        AtlasError::invalid("distribution", format!("invalid Normal parameters: {e}"))
    })?;
    Ok(rng.sample(dist))
}

/// Percentile value from a **sorted** slice using linear interpolation.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
    pub frequency: f64,
}

/// Equal-width histogram with `num_bins` bins over the observed range.
pub fn build_histogram(sorted: &[f64], num_bins: usize) -> Vec<HistogramBin> {
    let min_val = sorted[0];
    let max_val = sorted[sorted.len() - 1];

    if (max_val - min_val).abs() < f64::EPSILON {
        return vec![HistogramBin {
            lower: min_val,
            upper: max_val,
            count: sorted.len() as u32,
            frequency: 1.0,
        }];
    }

    let bin_width = (max_val - min_val) / num_bins as f64;
    let n = sorted.len() as f64;

    let mut bins: Vec<HistogramBin> = (0..num_bins)
        .map(|i| {
            let lower = min_val + i as f64 * bin_width;
            let upper = if i == num_bins - 1 {
                max_val
            } else {
                min_val + (i + 1) as f64 * bin_width
            };
            HistogramBin {
                lower,
                upper,
                count: 0,
                frequency: 0.0,
            }
        })
        .collect();

    for &val in sorted {
        let mut idx = ((val - min_val) / bin_width).floor() as usize;
        if idx >= num_bins {
            idx = num_bins - 1;
        }
        bins[idx].count += 1;
    }

    for bin in &mut bins {
        bin.frequency = bin.count as f64 / n;
    }

    bins
}

/// Mean and population standard deviation of a slice (does not sort).
pub fn mean_and_stdev(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_of_single_value_is_itself() {
        assert_eq!(percentile_sorted(&[5.0], 95.0), 5.0);
    }

    #[test]
    fn histogram_has_requested_bin_count() {
        let sorted: Vec<f64> = (0..1000).map(|i| i as f64).collect();
        let bins = build_histogram(&sorted, 40);
        assert_eq!(bins.len(), 40);
        let total: u32 = bins.iter().map(|b| b.count).sum();
        assert_eq!(total, 1000);
    }

    #[test]
    fn histogram_degenerates_to_one_bin_for_constant_input() {
        let sorted = vec![5.0; 100];
        let bins = build_histogram(&sorted, 40);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 100);
    }
}
