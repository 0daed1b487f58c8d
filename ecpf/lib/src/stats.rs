//! Summary statistics of Monte Carlo samples.

use ordered_float::OrderedFloat;

use crate::{Error, Result};

/// The default number of samples taken by the CLI, and a sensible default for callers of
/// [`Search::monte_carlo_stats`](crate::Search::monte_carlo_stats)
pub const DEFAULT_NUM_SAMPLES: usize = 500_000;
/// Skewness needs at least this many samples
pub const MIN_SAMPLES: usize = 3;

/// Summary of the distribution of a score when every component is sampled within its tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonteCarloStats {
    pub num_samples: usize,
    pub mean: f64,
    /// Population standard deviation (i.e. with a denominator of `n`)
    pub std_dev: f64,
    /// Sample variance (i.e. with a denominator of `n - 1`)
    pub variance: f64,
    /// Adjusted Fisher-Pearson skewness.  This is `0.0` if all samples are equal.
    pub skewness: f64,
    /// 25th percentile
    pub q25: f64,
    pub median: f64,
    /// 75th percentile
    pub q75: f64,
}

impl MonteCarloStats {
    /// Compute the statistics of some samples.  Fails if there are fewer than [`MIN_SAMPLES`]
    /// samples.
    pub fn from_samples(samples: &[f64]) -> Result<Self> {
        let n = samples.len();
        if n < MIN_SAMPLES {
            return Err(Error::InsufficientSamples {
                requested: n,
                required: MIN_SAMPLES,
            });
        }
        let n_f = n as f64;

        let mean = samples.iter().sum::<f64>() / n_f;
        let sum_sq_dev: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
        let sum_cube_dev: f64 = samples.iter().map(|x| (x - mean).powi(3)).sum();
        let std_dev = (sum_sq_dev / n_f).sqrt();
        let variance = sum_sq_dev / (n_f - 1.0);
        let skewness = if std_dev > 0.0 {
            n_f / ((n_f - 1.0) * (n_f - 2.0)) * sum_cube_dev / std_dev.powi(3)
        } else {
            0.0 // Avoid returning `NaN` if every sample is the same
        };

        let mut sorted = samples.to_vec();
        sorted.sort_by_key(|&x| OrderedFloat(x));

        Ok(Self {
            num_samples: n,
            mean,
            std_dev,
            variance,
            skewness,
            q25: percentile(&sorted, 0.25),
            median: percentile(&sorted, 0.5),
            q75: percentile(&sorted, 0.75),
        })
    }
}

/// The `q`th quantile of a non-empty sorted slice, taking the midpoint of the two nearest samples
/// if it falls between them.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let idx = q * (sorted.len() - 1) as f64;
    let lower = sorted[idx.floor() as usize];
    let upper = sorted[idx.ceil() as usize];
    (lower + upper) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn constant_samples() {
        let stats = MonteCarloStats::from_samples(&[10.0; 1000]).unwrap();
        assert_eq!(stats.num_samples, 1000);
        assert_eq!(stats.mean, 10.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.skewness, 0.0);
        assert_eq!((stats.q25, stats.median, stats.q75), (10.0, 10.0, 10.0));
    }

    #[test]
    fn known_values() {
        // Unsorted on purpose
        let stats = MonteCarloStats::from_samples(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert!(approx_eq(stats.mean, 2.5));
        assert!(approx_eq(stats.std_dev, 1.25f64.sqrt()));
        assert!(approx_eq(stats.variance, 5.0 / 3.0));
        assert!(approx_eq(stats.skewness, 0.0));
        // Index 0.75 lies between 1 and 2, so the midpoint is taken
        assert!(approx_eq(stats.q25, 1.5));
        assert!(approx_eq(stats.median, 2.5));
        assert!(approx_eq(stats.q75, 3.5));
    }

    #[test]
    fn skewed_right() {
        let stats = MonteCarloStats::from_samples(&[1.0, 1.0, 1.0, 10.0]).unwrap();
        assert!(stats.skewness > 0.0);
        let stats = MonteCarloStats::from_samples(&[1.0, 10.0, 10.0, 10.0]).unwrap();
        assert!(stats.skewness < 0.0);
    }

    #[test]
    fn percentiles() {
        #[track_caller]
        fn check(sorted: &[f64], q: f64, exp: f64) {
            assert_eq!(percentile(sorted, q), exp);
        }

        check(&[1.0, 2.0, 3.0], 0.5, 2.0);
        check(&[1.0, 2.0, 3.0], 0.25, 1.5);
        check(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.25, 2.0);
        check(&[7.0], 0.75, 7.0);
    }

    #[test]
    fn too_few_samples() {
        for n in 0..MIN_SAMPLES {
            assert!(matches!(
                MonteCarloStats::from_samples(&vec![1.0; n]),
                Err(Error::InsufficientSamples {
                    requested,
                    required: 3,
                }) if requested == n
            ));
        }
    }
}
