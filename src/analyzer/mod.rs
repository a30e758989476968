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
//! Module that performs the Monte-Carlo reliability analysis.
//!
//! Every trial samples a degraded subgraph of the topology, checks that it satisfies the
//! [`ConnectivityPolicy`], routes the traffic and computes the network delay. Trials that fail the
//! connectivity check (or cannot be routed) are invalid and excluded from the estimate. A valid
//! trial is successful if its delay is strictly below `t_max`.

use std::time::Instant;

use itertools::Itertools;
use rand::prelude::*;
use thiserror::Error;

use netrel_utils::stats::hoeffding;

use crate::{
    connectivity::ConnectivityPolicy,
    delay::{Delay, DelayModel},
    routing::{self, FlowAssignment, RoutingError},
    topology::{Topology, TopologyError},
    traffic::TrafficMatrix,
    util,
};

mod result;
mod trial;

pub use result::*;
pub use trial::*;

/// Run `iterations` trials on a single thread and accumulate their outcomes.
///
/// The traffic matrix must have as many nodes as the topology. Unlike [`Analyzer::new`], this
/// function does not route a baseline, so a mismatch is not reported as an error: every trial
/// would be unroutable and the estimate degenerate.
pub fn estimate<R: Rng + ?Sized>(
    topology: &Topology,
    traffic: &TrafficMatrix,
    t_max: f64,
    packet_size: f64,
    policy: ConnectivityPolicy,
    iterations: usize,
    rng: &mut R,
) -> ReliabilityEstimate {
    debug_assert_eq!(
        topology.num_nodes(),
        traffic.num_nodes(),
        "traffic matrix and topology differ in size"
    );
    let setup = TrialSetup {
        topology,
        traffic,
        delay_model: DelayModel::new(packet_size),
        t_max,
        policy,
    };
    let mut result = ReliabilityEstimate::default();
    for _ in 0..iterations {
        result.record(&setup.run(rng).outcome);
    }
    result
}

/// Monte-Carlo estimator for a fixed topology and traffic matrix.
#[derive(Debug, Clone)]
pub struct Analyzer {
    topology: Topology,
    traffic: TrafficMatrix,
    /// Flows on the topology without any failures.
    baseline: FlowAssignment,
    baseline_delay: Delay,
    t_max: f64,
    delay_model: DelayModel,
    policy: ConnectivityPolicy,
    /// Confidence (1-alpha), typically 95% or 99%.
    confidence: f64,
    /// Width of the interval around the estimate used for the Hoeffding bound.
    precision: f64,
    /// Explicit number of samples, overriding the Hoeffding bound.
    num_samples: Option<usize>,
    workers: usize,
    seed: u64,
}

impl Analyzer {
    /// Create a new analyzer. The base topology must be connected and the traffic must be routable
    /// on it, otherwise the whole analysis is meaningless and an error is returned.
    pub fn new(
        topology: Topology,
        traffic: TrafficMatrix,
        t_max: f64,
        packet_size: f64,
    ) -> Result<Self, AnalyzerError> {
        if !(packet_size.is_finite() && packet_size > 0.0) {
            return Err(AnalyzerError::InvalidPacketSize(packet_size));
        }
        if t_max.is_nan() || t_max <= 0.0 {
            return Err(AnalyzerError::InvalidThreshold(t_max));
        }
        topology.validate_connected()?;

        let delay_model = DelayModel::new(packet_size);
        let baseline = routing::route(&topology, &traffic)?;
        let baseline_delay = delay_model.delay(&baseline, &topology);
        log::debug!(
            "Baseline: {} demands on {} links, delay {}",
            traffic.num_demands(),
            baseline.num_loaded_edges(),
            baseline_delay
        );
        if let Some((edge, flow)) = baseline.max_loaded_edge() {
            log::trace!("Most loaded link: {} with {} packets/s", edge, flow);
        }

        Ok(Self {
            topology,
            traffic,
            baseline,
            baseline_delay,
            t_max,
            delay_model,
            policy: ConnectivityPolicy::default(),
            confidence: 0.95,
            precision: 0.05,
            num_samples: None,
            workers: util::num_workers(),
            seed: 42,
        })
    }

    /// Perform the analysis on `self.workers` threads. The samples are distributed evenly among the
    /// workers, each with its own random generator seeded from `self.seed`.
    pub fn analyze(&self) -> AnalysisResult {
        let n_samples = self.num_samples();
        let workers = self.workers;
        let per_worker = n_samples / workers;
        let remainder = n_samples % workers;
        log::debug!(
            "Analyzing {} samples on {} workers (seed {})",
            n_samples,
            workers,
            self.seed
        );

        let start = Instant::now();
        let seeds = self.worker_seeds();

        let estimates: Vec<ReliabilityEstimate> = crossbeam_utils::thread::scope(|s| {
            let handles = seeds
                .iter()
                .enumerate()
                .map(|(w, &seed)| {
                    let iters = per_worker + usize::from(w < remainder);
                    s.spawn(move |_| self.worker(seed, iters))
                })
                .collect_vec();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        })
        .unwrap_or_else(|e| std::panic::resume_unwind(e));

        let estimate: ReliabilityEstimate = estimates.into_iter().sum();

        AnalysisResult {
            estimate,
            baseline_delay: Some(self.baseline_delay),
            confidence: self.confidence,
            precision: self.precision,
            n_samples,
            workers,
            seed: self.seed,
            t_wall: start.elapsed(),
        }
    }

    /// Seeds of the worker generators, drawn from a generator seeded with `self.seed`.
    fn worker_seeds(&self) -> Vec<u64> {
        let mut master = StdRng::seed_from_u64(self.seed);
        (0..self.workers).map(|_| master.gen()).collect()
    }

    fn worker(&self, seed: u64, iters: usize) -> ReliabilityEstimate {
        let mut rng = StdRng::seed_from_u64(seed);
        self.estimate(iters, &mut rng)
    }

    /// Run `iterations` trials on the current thread.
    pub fn estimate<R: Rng + ?Sized>(&self, iterations: usize, rng: &mut R) -> ReliabilityEstimate {
        estimate(
            &self.topology,
            &self.traffic,
            self.t_max,
            self.delay_model.packet_size,
            self.policy,
            iterations,
            rng,
        )
    }

    /// Perform a single trial.
    pub fn simulate_once<R: Rng + ?Sized>(&self, rng: &mut R) -> Trial {
        self.trial_setup().run(rng)
    }

    fn trial_setup(&self) -> TrialSetup<'_> {
        TrialSetup {
            topology: &self.topology,
            traffic: &self.traffic,
            delay_model: self.delay_model,
            t_max: self.t_max,
            policy: self.policy,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn traffic(&self) -> &TrafficMatrix {
        &self.traffic
    }

    /// Flows of the network without any failures.
    pub fn baseline(&self) -> &FlowAssignment {
        &self.baseline
    }

    pub fn baseline_delay(&self) -> Delay {
        self.baseline_delay
    }

    pub fn t_max(&self) -> f64 {
        self.t_max
    }

    pub fn packet_size(&self) -> f64 {
        self.delay_model.packet_size
    }

    pub fn policy(&self) -> ConnectivityPolicy {
        self.policy
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Set the confidence (`1 - alpha`). Typically, this value should be 95% or 99%.
    pub fn set_confidence(&mut self, confidence: f64) -> Result<(), AnalyzerError> {
        self.confidence = check_confidence(confidence)?;
        Ok(())
    }

    /// Set the precision.
    pub fn set_precision(&mut self, precision: f64) -> Result<(), AnalyzerError> {
        self.precision = check_precision(precision)?;
        Ok(())
    }

    /// Set the number of collected samples explicitly.
    pub fn set_num_samples(&mut self, num_samples: usize) {
        self.num_samples = Some(num_samples)
    }

    pub fn set_workers(&mut self, workers: usize) -> Result<(), AnalyzerError> {
        if workers == 0 {
            return Err(AnalyzerError::NoWorkers);
        }
        self.workers = workers;
        Ok(())
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed
    }

    pub fn set_policy(&mut self, policy: ConnectivityPolicy) {
        self.policy = policy
    }

    /// The explicitly set number of samples, or the number required to reach the configured
    /// confidence and precision.
    pub fn num_samples(&self) -> usize {
        self.num_samples
            .unwrap_or_else(|| hoeffding(self.confidence, self.precision))
    }
}

/// Check that `confidence` lies in `(0, 1)`.
pub fn check_confidence(confidence: f64) -> Result<f64, AnalyzerError> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(confidence)
    } else {
        Err(AnalyzerError::InvalidConfidence(confidence))
    }
}

/// Check that `precision` lies in `(0, 1]`.
pub fn check_precision(precision: f64) -> Result<f64, AnalyzerError> {
    if precision > 0.0 && precision <= 1.0 {
        Ok(precision)
    } else {
        Err(AnalyzerError::InvalidPrecision(precision))
    }
}

/// Error thrown when setting up the analysis.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("Invalid packet size: {0}")]
    InvalidPacketSize(f64),
    #[error("Invalid delay threshold: {0}")]
    InvalidThreshold(f64),
    #[error("Invalid confidence: {0}")]
    InvalidConfidence(f64),
    #[error("Invalid precision: {0}")]
    InvalidPrecision(f64),
    #[error("At least one worker is required")]
    NoWorkers,
    #[error("Invalid base topology: {0}")]
    Topology(#[from] TopologyError),
    #[error("Cannot route the traffic on the base topology: {0}")]
    Baseline(#[from] RoutingError),
}
