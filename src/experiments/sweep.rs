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
//! Sweeps that vary one parameter of the network and estimate the reliability at every step.

use std::fmt;

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    analyzer::{Analyzer, AnalyzerError, ReliabilityEstimate},
    connectivity::ConnectivityPolicy,
    delay::Delay,
    topology::{Edge, Link, Topology, TopologyError},
    traffic::{TrafficError, TrafficMatrix},
    util,
};

/// Parameter varied by a sweep.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SweepAxis {
    /// Multiply every demand by the value.
    TrafficScale,
    /// Multiply every link capacity by the value.
    CapacityScale,
    /// Add the given number of random links to the topology.
    AddedEdges,
}

/// Estimate at one step of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub axis: SweepAxis,
    pub value: f64,
    pub num_edges: usize,
    pub total_demand: f64,
    pub baseline_delay: Delay,
    pub estimate: ReliabilityEstimate,
}

impl fmt::Display for SweepPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={:<6.3} links: {:>3}, demand: {:>8.2}, baseline: {}, {}",
            self.axis,
            self.value,
            self.num_edges,
            self.total_demand,
            self.baseline_delay,
            self.estimate,
        )
    }
}

/// Varies a single axis while keeping all other inputs fixed. Every step uses the same seed, such
/// that the steps are evaluated on the same random failure samples wherever possible.
#[derive(Debug, Clone)]
pub struct SweepExperiment {
    topology: Topology,
    traffic: TrafficMatrix,
    axis: SweepAxis,
    values: Vec<f64>,
    t_max: f64,
    packet_size: f64,
    num_samples: usize,
    workers: usize,
    seed: u64,
    policy: ConnectivityPolicy,
}

impl SweepExperiment {
    pub fn new(
        topology: Topology,
        traffic: TrafficMatrix,
        axis: SweepAxis,
        values: Vec<f64>,
    ) -> Self {
        Self {
            topology,
            traffic,
            axis,
            values,
            t_max: 0.5,
            packet_size: 1000.0,
            num_samples: 1000,
            workers: util::num_workers(),
            seed: 42,
            policy: ConnectivityPolicy::default(),
        }
    }

    pub fn t_max(mut self, t_max: f64) -> Self {
        self.t_max = t_max;
        self
    }

    pub fn packet_size(mut self, packet_size: f64) -> Self {
        self.packet_size = packet_size;
        self
    }

    pub fn num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn policy(mut self, policy: ConnectivityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn axis(&self) -> SweepAxis {
        self.axis
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Evaluate all steps in order.
    pub fn run(&self) -> Result<Vec<SweepPoint>, ExperimentError> {
        self.run_with(|_| {})
    }

    /// Evaluate all steps in order, calling `on_step` after each step.
    pub fn run_with<F>(&self, mut on_step: F) -> Result<Vec<SweepPoint>, ExperimentError>
    where
        F: FnMut(&SweepPoint),
    {
        log::info!(
            "Sweeping {} over {} steps ({} samples each)",
            self.axis,
            self.values.len(),
            self.num_samples
        );

        // one fixed order of the candidate links, such that the steps are cumulative
        let mut candidates = Vec::new();
        if self.axis == SweepAxis::AddedEdges {
            candidates = self.topology.non_adjacent_pairs();
            candidates.shuffle(&mut StdRng::seed_from_u64(self.seed));
        }

        let mut points = Vec::with_capacity(self.values.len());
        for &value in self.values.iter() {
            let (topology, traffic) = self.step(value, &candidates)?;
            let num_edges = topology.num_edges();
            let total_demand = traffic.total();

            let wrap = |source| ExperimentError::Analyzer {
                axis: self.axis,
                value,
                source,
            };
            let mut analyzer =
                Analyzer::new(topology, traffic, self.t_max, self.packet_size).map_err(wrap)?;
            analyzer.set_num_samples(self.num_samples);
            analyzer.set_workers(self.workers).map_err(wrap)?;
            analyzer.set_seed(self.seed);
            analyzer.set_policy(self.policy);

            let result = analyzer.analyze();
            let point = SweepPoint {
                axis: self.axis,
                value,
                num_edges,
                total_demand,
                baseline_delay: analyzer.baseline_delay(),
                estimate: result.estimate,
            };
            log::debug!("{}", point);
            on_step(&point);
            points.push(point);
        }
        Ok(points)
    }

    /// Topology and traffic matrix of the step with the given value.
    fn step(
        &self,
        value: f64,
        candidates: &[Edge],
    ) -> Result<(Topology, TrafficMatrix), ExperimentError> {
        Ok(match self.axis {
            SweepAxis::TrafficScale => (self.topology.clone(), self.traffic.scaled(value)?),
            SweepAxis::CapacityScale => (
                self.topology.with_scaled_capacities(value)?,
                self.traffic.clone(),
            ),
            SweepAxis::AddedEdges => {
                if !(value.is_finite() && value >= 0.0 && value.fract() == 0.0) {
                    return Err(ExperimentError::InvalidStep {
                        axis: self.axis,
                        value,
                    });
                }
                let k = value as usize;
                if k > candidates.len() {
                    return Err(TopologyError::TooManyEdges {
                        requested: self.topology.num_edges() + k,
                        max: self.topology.num_edges() + candidates.len(),
                    }
                    .into());
                }
                let mut topology = self.topology.clone();
                if k > 0 {
                    let template = self.template_link()?;
                    for edge in &candidates[..k] {
                        let (a, b) = edge.endpoints();
                        topology.add_link(a, b, template)?;
                    }
                }
                (topology, self.traffic.clone())
            }
        })
    }

    /// Attributes of added links: the mean capacity, cost and survival of the base topology.
    fn template_link(&self) -> Result<Link, ExperimentError> {
        match (
            self.topology.mean_capacity(),
            self.topology.mean_cost(),
            self.topology.mean_survival(),
        ) {
            (Some(capacity), Some(cost), Some(survival)) => Ok(Link::new(capacity, cost, survival)),
            _ => Err(ExperimentError::NoTemplate),
        }
    }
}

/// Error thrown while running a sweep.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExperimentError {
    #[error("Cannot analyze {axis}={value}: {source}")]
    Analyzer {
        axis: SweepAxis,
        value: f64,
        source: AnalyzerError,
    },
    #[error("Invalid topology: {0}")]
    Topology(#[from] TopologyError),
    #[error("Invalid traffic: {0}")]
    Traffic(#[from] TrafficError),
    #[error("Invalid value for {axis}: {value}")]
    InvalidStep { axis: SweepAxis, value: f64 },
    #[error("The base topology has no links to derive new links from")]
    NoTemplate,
}

#[cfg(test)]
mod test {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::topology::TopologyBuilder;

    fn network() -> (Topology, TrafficMatrix) {
        let mut topo = Topology::new(5);
        for i in 0..5 {
            topo.add_link(i, (i + 1) % 5, Link::new(10_000.0, 1.0, 0.75))
                .unwrap();
        }
        let mut traffic = TrafficMatrix::new(5);
        traffic.set(0, 2, 2.0).unwrap();
        traffic.set(3, 1, 1.0).unwrap();
        (topo, traffic)
    }

    #[test]
    fn axis_names() {
        let names: Vec<String> = SweepAxis::iter().map(|a| a.to_string()).collect();
        assert_eq!(names, vec!["traffic_scale", "capacity_scale", "added_edges"]);
        assert_eq!(
            "added_edges".parse::<SweepAxis>().unwrap(),
            SweepAxis::AddedEdges
        );
    }

    #[test]
    fn traffic_scale_steps() {
        let (topo, traffic) = network();
        let points = SweepExperiment::new(topo, traffic, SweepAxis::TrafficScale, vec![1.0, 2.0])
            .num_samples(50)
            .workers(1)
            .run()
            .unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].total_demand, 3.0);
        assert_eq!(points[1].total_demand, 6.0);
        assert!(points.iter().all(|p| p.estimate.iterations == 50));
    }

    #[test]
    fn added_edges_are_cumulative() {
        let (topo, traffic) = network();
        let sweep =
            SweepExperiment::new(topo, traffic, SweepAxis::AddedEdges, vec![0.0, 2.0, 5.0]);
        let mut candidates = sweep.topology.non_adjacent_pairs();
        assert_eq!(candidates.len(), 5);
        candidates.shuffle(&mut StdRng::seed_from_u64(42));

        let (t2, _) = sweep.step(2.0, &candidates).unwrap();
        let (t5, _) = sweep.step(5.0, &candidates).unwrap();
        assert_eq!(t2.num_edges(), 7);
        assert_eq!(t5.num_edges(), 10);
        for (edge, link) in t2.links() {
            assert_eq!(t5.link(edge), Some(link));
        }
        let added = t5.link(candidates[0]).unwrap();
        assert_eq!(*added, Link::new(10_000.0, 1.0, 0.75));

        assert_eq!(
            sweep.step(1.5, &candidates).unwrap_err(),
            ExperimentError::InvalidStep {
                axis: SweepAxis::AddedEdges,
                value: 1.5
            }
        );
        assert!(matches!(
            sweep.step(6.0, &candidates),
            Err(ExperimentError::Topology(TopologyError::TooManyEdges { .. }))
        ));
    }

    #[test]
    fn callback_sees_every_step() {
        let mut rng = StdRng::seed_from_u64(1);
        let topo = TopologyBuilder::new()
            .num_nodes(8)
            .num_edges(10)
            .build(&mut rng)
            .unwrap();
        let traffic = crate::traffic::TrafficModel::Uniform { min: 1, max: 2 }
            .generate(8, &mut rng)
            .unwrap();
        let mut seen = Vec::new();
        SweepExperiment::new(topo, traffic, SweepAxis::CapacityScale, vec![1.0, 2.0, 3.0])
            .num_samples(20)
            .workers(2)
            .run_with(|p| seen.push(p.value))
            .unwrap();
        assert_eq!(seen, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn invalid_capacity_scale() {
        let (topo, traffic) = network();
        let result = SweepExperiment::new(topo, traffic, SweepAxis::CapacityScale, vec![0.0])
            .workers(1)
            .run();
        assert_eq!(
            result.unwrap_err(),
            ExperimentError::Topology(TopologyError::InvalidScale(0.0))
        );
    }
}
