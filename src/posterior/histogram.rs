//! Histograms of posterior samples
//!
//! Equal-width bins spanning the sample range. Every bin is half-open except
//! the last, which also holds the maximum. With `density` the bar heights
//! integrate to one.

use crate::error::PrepError;
use log::debug;
use serde::{Deserialize, Serialize};

/// Default number of bins
pub const DEFAULT_BINS: usize = 30;

/// Binned samples of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub parameter: String,
    /// `bins + 1` ascending bin edges
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// Counts, or densities when `density` is set
    pub values: Vec<f64>,
    pub density: bool,
}

impl Histogram {
    /// Bin the finite samples of `parameter`
    pub fn of(
        parameter: &str,
        samples: &[f64],
        bins: usize,
        density: bool,
    ) -> Result<Self, PrepError> {
        if bins == 0 {
            return Err(PrepError::InvalidBins);
        }

        let finite: Vec<f64> = samples.iter().copied().filter(|x| x.is_finite()).collect();
        if finite.len() < samples.len() {
            debug!(
                "{parameter}: ignoring {} non-finite samples",
                samples.len() - finite.len()
            );
        }
        if finite.is_empty() {
            return Err(PrepError::EmptyTrace(parameter.to_string()));
        }

        let mut lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins)
            .map(|i| if i == bins { hi } else { lo + width * i as f64 })
            .collect();

        let mut counts = vec![0usize; bins];
        for x in &finite {
            let idx = (((x - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let n = finite.len() as f64;
        let values = counts
            .iter()
            .map(|&c| if density { c as f64 / (n * width) } else { c as f64 })
            .collect();

        Ok(Self {
            parameter: parameter.to_string(),
            edges,
            counts,
            values,
            density,
        })
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }

    /// Total number of binned samples
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_edges() {
        let h = Histogram::of("a_rt", &[0.0, 1.0, 2.0, 3.0, 4.0], 4, false).unwrap();
        assert_eq!(h.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        // The maximum falls into the last, closed bin
        assert_eq!(h.counts, vec![1, 1, 1, 2]);
        assert_eq!(h.total(), 5);
    }

    #[test]
    fn test_density_integrates_to_one() {
        let samples: Vec<f64> = (0..500).map(|i| ((i * 37) % 101) as f64 / 17.0 - 2.0).collect();
        let h = Histogram::of("v_numFW", &samples, DEFAULT_BINS, true).unwrap();

        let area: f64 = h.values.iter().map(|d| d * h.width()).sum();
        assert!((area - 1.0).abs() < 1e-9);
        assert_eq!(h.bins(), 30);
    }

    #[test]
    fn test_constant_samples() {
        let h = Histogram::of("t", &[0.3, 0.3, 0.3], 2, false).unwrap();
        assert!((h.edges[0] - -0.2).abs() < 1e-12);
        assert!((h.edges[2] - 0.8).abs() < 1e-12);
        assert_eq!(h.total(), 3);
    }

    #[test]
    fn test_rejects_empty_and_zero_bins() {
        assert!(matches!(Histogram::of("v", &[], 10, true), Err(PrepError::EmptyTrace(_))));
        assert!(matches!(
            Histogram::of("v", &[f64::NAN], 10, true),
            Err(PrepError::EmptyTrace(_))
        ));
        assert!(matches!(Histogram::of("v", &[1.0], 0, true), Err(PrepError::InvalidBins)));
    }
}
