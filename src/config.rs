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
//! Description of an experiment that can be loaded from a JSON file.

use std::path::Path;

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netrel_utils::stats::{hoeffding, linspace};

use crate::{
    analyzer::{check_confidence, check_precision, Analyzer, AnalyzerError},
    connectivity::ConnectivityPolicy,
    experiments::{SweepAxis, SweepExperiment},
    routing::{self, RoutingError},
    topology::{Topology, TopologyBuilder, TopologyError},
    traffic::{TrafficError, TrafficMatrix, TrafficModel},
};

/// How link capacities are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CapacityModel {
    /// Keep the capacities drawn by the topology builder.
    #[default]
    Drawn,
    /// Dimension every link for its flow without failures, with the given safety margin (see
    /// [`Topology::dimension_capacities`]).
    Dimensioned { margin: f64 },
}

/// A sweep over `steps` evenly spaced values from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub axis: SweepAxis,
    pub start: f64,
    pub end: f64,
    pub steps: usize,
}

impl SweepConfig {
    pub fn values(&self) -> Vec<f64> {
        let values = linspace(self.start, self.end, self.steps);
        if self.axis == SweepAxis::AddedEdges {
            values.into_iter().map(f64::round).collect()
        } else {
            values
        }
    }
}

/// Complete description of an experiment. Missing fields take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub topology: TopologyBuilder,
    pub capacity: CapacityModel,
    pub traffic: TrafficModel,
    /// Delay threshold in seconds.
    pub t_max: f64,
    /// Mean packet size in bits.
    pub packet_size: f64,
    /// Number of Monte-Carlo samples. If `None`, it is derived from `confidence` and `precision`.
    pub num_samples: Option<usize>,
    pub confidence: f64,
    pub precision: f64,
    /// Number of worker threads, all CPUs if `None`.
    pub workers: Option<usize>,
    pub seed: u64,
    pub policy: ConnectivityPolicy,
    pub sweeps: Vec<SweepConfig>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            topology: TopologyBuilder::default(),
            capacity: CapacityModel::Drawn,
            traffic: TrafficModel::default(),
            t_max: 0.5,
            packet_size: 1000.0,
            num_samples: Some(1000),
            confidence: 0.95,
            precision: 0.05,
            workers: None,
            seed: 42,
            policy: ConnectivityPolicy::DemandPairs,
            sweeps: vec![
                SweepConfig {
                    axis: SweepAxis::TrafficScale,
                    start: 1.0,
                    end: 3.0,
                    steps: 9,
                },
                SweepConfig {
                    axis: SweepAxis::CapacityScale,
                    start: 1.0,
                    end: 3.0,
                    steps: 9,
                },
                SweepConfig {
                    axis: SweepAxis::AddedEdges,
                    start: 0.0,
                    end: 10.0,
                    steps: 11,
                },
            ],
        }
    }
}

impl ExperimentConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of samples per estimate. Fails if the confidence or the precision is out of range,
    /// even if the number of samples is given explicitly.
    pub fn num_samples(&self) -> Result<usize, ConfigError> {
        let confidence = check_confidence(self.confidence)?;
        let precision = check_precision(self.precision)?;
        Ok(self
            .num_samples
            .unwrap_or_else(|| hoeffding(confidence, precision)))
    }

    /// Generate the topology and the traffic matrix.
    pub fn build_network<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(Topology, TrafficMatrix), ConfigError> {
        let mut topology = self.topology.build(rng)?;
        let traffic = self.traffic.generate(topology.num_nodes(), rng)?;
        if let CapacityModel::Dimensioned { margin } = self.capacity {
            let flows = routing::route(&topology, &traffic)?;
            topology.dimension_capacities(&flows, self.packet_size, margin)?;
        }
        log::info!(
            "Generated network with {} nodes, {} links and {} demands",
            topology.num_nodes(),
            topology.num_edges(),
            traffic.num_demands()
        );
        Ok((topology, traffic))
    }

    /// Create the analyzer for the given network.
    pub fn analyzer(
        &self,
        topology: Topology,
        traffic: TrafficMatrix,
    ) -> Result<Analyzer, ConfigError> {
        let mut analyzer = Analyzer::new(topology, traffic, self.t_max, self.packet_size)?;
        analyzer.set_confidence(self.confidence)?;
        analyzer.set_precision(self.precision)?;
        if let Some(num_samples) = self.num_samples {
            analyzer.set_num_samples(num_samples);
        }
        if let Some(workers) = self.workers {
            analyzer.set_workers(workers)?;
        }
        analyzer.set_seed(self.seed);
        analyzer.set_policy(self.policy);
        Ok(analyzer)
    }

    /// Generate the network from `self.seed` and create its analyzer.
    pub fn build_analyzer(&self) -> Result<Analyzer, ConfigError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let (topology, traffic) = self.build_network(&mut rng)?;
        self.analyzer(topology, traffic)
    }

    /// The configured sweeps on the given network.
    pub fn sweep_experiments(
        &self,
        topology: &Topology,
        traffic: &TrafficMatrix,
    ) -> Result<Vec<SweepExperiment>, ConfigError> {
        let num_samples = self.num_samples()?;
        let workers = self.workers.unwrap_or_else(crate::util::num_workers);
        Ok(self
            .sweeps
            .iter()
            .map(|sweep| {
                SweepExperiment::new(topology.clone(), traffic.clone(), sweep.axis, sweep.values())
                    .t_max(self.t_max)
                    .packet_size(self.packet_size)
                    .num_samples(num_samples)
                    .workers(workers)
                    .seed(self.seed)
                    .policy(self.policy)
            })
            .collect())
    }
}

/// Error thrown when loading a configuration or building the experiment it describes.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read the configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot parse the configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cannot build the topology: {0}")]
    Topology(#[from] TopologyError),
    #[error("Cannot generate the traffic: {0}")]
    Traffic(#[from] TrafficError),
    #[error("Cannot route the traffic: {0}")]
    Routing(#[from] RoutingError),
    #[error("Invalid analysis parameters: {0}")]
    Analyzer(#[from] AnalyzerError),
}
