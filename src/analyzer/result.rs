// NetRel: Monte-Carlo Estimation of Delay and Reliability in Capacitated Networks
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Describes the result of a reliability estimate.

use std::{
    iter::Sum,
    ops::{Add, AddAssign},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use netrel_utils::stats::wilson_interval;

use super::trial::TrialOutcome;
use crate::delay::Delay;

/// Counters accumulated over the trials of a Monte-Carlo estimate. Estimates of disjoint sets of
/// trials are combined by summation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityEstimate {
    /// Number of performed trials, including invalid ones.
    pub iterations: usize,
    /// Number of trials that satisfied the connectivity policy and could be routed.
    pub valid_trials: usize,
    /// Number of valid trials whose delay was below the threshold.
    pub successes: usize,
    /// Number of valid trials with a saturated link.
    pub saturated_trials: usize,
    /// Number of valid trials with a finite delay.
    pub finite_trials: usize,
    /// Sum of all finite delays.
    pub delay_sum: f64,
    /// Largest delay among the successful trials.
    pub max_successful_delay: Option<f64>,
}

impl ReliabilityEstimate {
    /// Account for one trial.
    pub fn record(&mut self, outcome: &TrialOutcome) {
        self.iterations += 1;
        match outcome {
            TrialOutcome::Disconnected | TrialOutcome::Unroutable(_) => {}
            TrialOutcome::Success(t) => {
                self.valid_trials += 1;
                self.successes += 1;
                self.finite_trials += 1;
                self.delay_sum += t;
                self.max_successful_delay =
                    Some(self.max_successful_delay.map_or(*t, |m| m.max(*t)));
            }
            TrialOutcome::Violation(delay) => {
                self.valid_trials += 1;
                match delay {
                    Delay::Finite(t) => {
                        self.finite_trials += 1;
                        self.delay_sum += t;
                    }
                    Delay::Saturated(_) => self.saturated_trials += 1,
                    Delay::NoDemand => {}
                }
            }
        }
    }

    /// Combine the counters of two estimates.
    pub fn merge(&mut self, other: &Self) {
        self.iterations += other.iterations;
        self.valid_trials += other.valid_trials;
        self.successes += other.successes;
        self.saturated_trials += other.saturated_trials;
        self.finite_trials += other.finite_trials;
        self.delay_sum += other.delay_sum;
        self.max_successful_delay = match (self.max_successful_delay, other.max_successful_delay) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Probability of meeting the delay threshold given that the network stays connected, i.e.,
    /// `successes / valid_trials`. Returns 0 if there was no valid trial (see
    /// [`Self::is_degenerate`]).
    pub fn reliability(&self) -> f64 {
        if self.valid_trials == 0 {
            0.0
        } else {
            self.successes as f64 / self.valid_trials as f64
        }
    }

    /// Whether no trial was valid, in which case the reliability is a placeholder.
    pub fn is_degenerate(&self) -> bool {
        self.valid_trials == 0
    }

    pub fn invalid_trials(&self) -> usize {
        self.iterations - self.valid_trials
    }

    /// Probability of meeting the delay threshold, counting disconnected trials as failures.
    pub fn unconditional_reliability(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.successes as f64 / self.iterations as f64
        }
    }

    /// Fraction of trials that were valid.
    pub fn connectivity_ratio(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.valid_trials as f64 / self.iterations as f64
        }
    }

    /// Mean over all finite delays.
    pub fn mean_delay(&self) -> Option<f64> {
        (self.finite_trials > 0).then(|| self.delay_sum / self.finite_trials as f64)
    }

    /// Wilson score interval of the reliability.
    pub fn confidence_interval(&self, confidence: f64) -> Option<(f64, f64)> {
        wilson_interval(self.successes, self.valid_trials, confidence)
    }
}

impl AddAssign<&ReliabilityEstimate> for ReliabilityEstimate {
    fn add_assign(&mut self, rhs: &ReliabilityEstimate) {
        self.merge(rhs)
    }
}

impl Add for ReliabilityEstimate {
    type Output = ReliabilityEstimate;

    fn add(mut self, rhs: Self) -> Self::Output {
        self.merge(&rhs);
        self
    }
}

impl Sum for ReliabilityEstimate {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl std::fmt::Display for ReliabilityEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "reliability: {:>7.3}% ({} / {} valid, {} invalid, {} saturated)",
            self.reliability() * 100.0,
            self.successes,
            self.valid_trials,
            self.invalid_trials(),
            self.saturated_trials,
        )?;
        if self.is_degenerate() {
            write!(f, " [degenerate]")?;
        }
        Ok(())
    }
}

/// Result of the analysis including the wall time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The accumulated counters
    pub estimate: ReliabilityEstimate,
    /// Delay of the network without any failures
    pub baseline_delay: Option<Delay>,
    /// confidence of the collected result
    pub confidence: f64,
    /// precision of the collected result
    pub precision: f64,
    /// Number of samples collected
    pub n_samples: usize,
    /// Number of workers that collected the samples
    pub workers: usize,
    /// Seed from which the worker seeds were derived
    pub seed: u64,
    /// Time to measure the time, from start to finish, using all k workers.
    pub t_wall: Duration,
}

impl AnalysisResult {
    pub fn reliability(&self) -> f64 {
        self.estimate.reliability()
    }

    pub fn confidence_interval(&self) -> Option<(f64, f64)> {
        self.estimate.confidence_interval(self.confidence)
    }
}

impl std::fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "reliability: {:>7.3}%, valid: {:>7.3}%, {} iterations (alpha={:.1}%), time: {:>8.2?} ({:>8.2}us / sample)",
            self.estimate.reliability() * 100.0,
            self.estimate.connectivity_ratio() * 100.0,
            self.n_samples,
            (1.0 - self.confidence) * 100.0,
            self.t_wall,
            (self.t_wall.as_micros() as f64) / self.n_samples.max(1) as f64,
        )?;
        if let Some((lo, hi)) = self.confidence_interval() {
            write!(f, ", interval: [{:.3}%, {:.3}%]", lo * 100.0, hi * 100.0)?;
        }
        if self.estimate.is_degenerate() {
            write!(f, " [degenerate: no valid trial]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{routing::RoutingError, topology::Edge};

    #[test]
    fn record_outcomes() {
        let mut est = ReliabilityEstimate::default();
        est.record(&TrialOutcome::Success(0.2));
        est.record(&TrialOutcome::Success(0.3));
        est.record(&TrialOutcome::Violation(Delay::Finite(0.7)));
        est.record(&TrialOutcome::Violation(Delay::Saturated(Edge::new(0, 1))));
        est.record(&TrialOutcome::Disconnected);
        est.record(&TrialOutcome::Unroutable(RoutingError::UnreachablePair(0, 1)));

        assert_eq!(est.iterations, 6);
        assert_eq!(est.valid_trials, 4);
        assert_eq!(est.successes, 2);
        assert_eq!(est.saturated_trials, 1);
        assert_eq!(est.invalid_trials(), 2);
        assert_eq!(est.reliability(), 0.5);
        assert!((est.unconditional_reliability() - 2.0 / 6.0).abs() < 1e-12);
        assert!((est.mean_delay().unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(est.max_successful_delay, Some(0.3));
    }

    #[test]
    fn degenerate_estimate() {
        let mut est = ReliabilityEstimate::default();
        for _ in 0..10 {
            est.record(&TrialOutcome::Disconnected);
        }
        assert!(est.is_degenerate());
        assert_eq!(est.reliability(), 0.0);
        assert_eq!(est.connectivity_ratio(), 0.0);
        assert_eq!(est.mean_delay(), None);
        assert_eq!(est.confidence_interval(0.95), None);
        assert!(est.to_string().ends_with("[degenerate]"));
    }

    #[test]
    fn merge_is_a_sum() {
        let mut a = ReliabilityEstimate::default();
        a.record(&TrialOutcome::Success(0.1));
        let mut b = ReliabilityEstimate::default();
        b.record(&TrialOutcome::Success(0.4));
        b.record(&TrialOutcome::Disconnected);

        let sum: ReliabilityEstimate = vec![a, b].into_iter().sum();
        assert_eq!(sum.iterations, 3);
        assert_eq!(sum.successes, 2);
        assert_eq!(sum.valid_trials, 2);
        assert_eq!(sum.max_successful_delay, Some(0.4));
        assert_eq!(a + b, b + a);
    }
}
