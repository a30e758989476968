//! Statistics helpers for Monte-Carlo estimates of a probability.

use statrs::distribution::{ContinuousCDF, Normal};

/// Compute the number of samples required to reach the given confidence and precision.
///
/// `precision` is the width of the interval around the estimate, i.e., the estimate is within
/// `precision / 2` of the true probability with probability at least `confidence`.
pub fn hoeffding(confidence: f64, precision: f64) -> usize {
    (f64::ln(2.0 / (1.0 - confidence)) / (0.5 * precision * precision)).ceil() as usize
}

/// Two-sided quantile of the standard normal distribution for the given confidence, e.g., ~1.96
/// for a confidence of 95%.
pub fn normal_quantile(confidence: f64) -> Option<f64> {
    if !(0.0..1.0).contains(&confidence) {
        return None;
    }
    let normal = Normal::new(0.0, 1.0).ok()?;
    Some(normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0))
}

/// Wilson score interval for `successes` out of `trials` Bernoulli samples. Returns `None` if
/// there are no trials or the confidence is not in `[0, 1)`.
pub fn wilson_interval(successes: usize, trials: usize, confidence: f64) -> Option<(f64, f64)> {
    if trials == 0 {
        return None;
    }
    let z = normal_quantile(confidence)?;
    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;

    let denominator = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denominator;
    let half_width = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denominator;

    Some((
        f64::max(0.0, center - half_width),
        f64::min(1.0, center + half_width),
    ))
}

/// `steps` evenly spaced values from `start` to `end` (both inclusive).
pub fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let delta = (end - start) / (steps - 1) as f64;
            (0..steps)
                .map(|i| {
                    if i == steps - 1 {
                        end
                    } else {
                        start + delta * i as f64
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hoeffding() {
        // ln(2 / 0.05) / (0.5 * 0.01^2) = 73777.59
        assert_eq!(hoeffding(0.95, 0.01), 73778);
        assert!(hoeffding(0.99, 0.01) > hoeffding(0.95, 0.01));
        assert!(hoeffding(0.95, 0.02) < hoeffding(0.95, 0.01));
    }

    #[test]
    fn test_normal_quantile() {
        let z = normal_quantile(0.95).unwrap();
        assert!((z - 1.959964).abs() < 1e-4);
        assert_eq!(normal_quantile(1.0), None);
    }

    #[test]
    fn test_wilson_interval() {
        assert_eq!(wilson_interval(0, 0, 0.95), None);

        let (lo, hi) = wilson_interval(50, 100, 0.95).unwrap();
        assert!(lo < 0.5 && 0.5 < hi);
        assert!((hi - lo - 0.19).abs() < 0.01);

        // degenerate proportions stay inside [0, 1]
        let (lo, hi) = wilson_interval(100, 100, 0.95).unwrap();
        assert!(lo > 0.9);
        assert!((hi - 1.0).abs() < 1e-9);
        let (lo, hi) = wilson_interval(0, 100, 0.95).unwrap();
        assert!(lo.abs() < 1e-9);
        assert!(hi < 0.1);
    }

    #[test]
    fn test_linspace() {
        assert!(linspace(1.0, 3.0, 0).is_empty());
        assert_eq!(linspace(1.0, 3.0, 1), vec![1.0]);
        assert_eq!(
            linspace(1.0, 3.0, 9),
            vec![1.0, 1.25, 1.5, 1.75, 2.0, 2.25, 2.5, 2.75, 3.0]
        );
    }
}
