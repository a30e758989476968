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
//! Traffic demand between ordered node pairs, and the models used to generate it.

use rand::prelude::*;
use rand_distr::Poisson;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::topology::NodeId;

/// Dense demand matrix in packets per second. The diagonal is always zero and every entry is
/// nonnegative and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SerializedTrafficMatrix")]
pub struct TrafficMatrix {
    num_nodes: usize,
    /// Row-major demands, `demands[src * num_nodes + dst]`.
    demands: Vec<f64>,
}

#[derive(Deserialize)]
struct SerializedTrafficMatrix {
    num_nodes: usize,
    demands: Vec<f64>,
}

impl TryFrom<SerializedTrafficMatrix> for TrafficMatrix {
    type Error = TrafficError;

    fn try_from(value: SerializedTrafficMatrix) -> Result<Self, Self::Error> {
        let n = value.num_nodes;
        if value.demands.len() != n * n {
            return Err(TrafficError::InvalidShape {
                num_nodes: n,
                len: value.demands.len(),
            });
        }
        let mut matrix = TrafficMatrix::new(n);
        for (i, demand) in value.demands.into_iter().enumerate() {
            let (src, dst) = (i / n, i % n);
            if src == dst {
                if demand != 0.0 {
                    return Err(TrafficError::SelfDemand(src));
                }
                continue;
            }
            matrix.set(src, dst, demand)?;
        }
        Ok(matrix)
    }
}

impl TrafficMatrix {
    /// Matrix for `num_nodes` nodes without any demand.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            demands: vec![0.0; num_nodes * num_nodes],
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Demand from `src` to `dst`. Unknown nodes have no demand.
    pub fn get(&self, src: NodeId, dst: NodeId) -> f64 {
        if src < self.num_nodes && dst < self.num_nodes {
            self.demands[src * self.num_nodes + dst]
        } else {
            0.0
        }
    }

    /// Set the demand from `src` to `dst`.
    pub fn set(&mut self, src: NodeId, dst: NodeId, demand: f64) -> Result<(), TrafficError> {
        for n in [src, dst] {
            if n >= self.num_nodes {
                return Err(TrafficError::UnknownNode(n));
            }
        }
        if src == dst {
            return Err(TrafficError::SelfDemand(src));
        }
        if !(demand.is_finite() && demand >= 0.0) {
            return Err(TrafficError::InvalidDemand(src, dst, demand));
        }
        self.demands[src * self.num_nodes + dst] = demand;
        Ok(())
    }

    /// All off-diagonal entries (including zeros) in row-major order.
    pub fn entries(&self) -> impl Iterator<Item = (NodeId, NodeId, f64)> + '_ {
        let n = self.num_nodes;
        self.demands
            .iter()
            .enumerate()
            .map(move |(i, d)| (i / n, i % n, *d))
            .filter(|(src, dst, _)| src != dst)
    }

    /// Pairs with a positive demand, in row-major order.
    pub fn demands(&self) -> impl Iterator<Item = (NodeId, NodeId, f64)> + '_ {
        self.entries().filter(|(_, _, d)| *d > 0.0)
    }

    pub fn num_demands(&self) -> usize {
        self.demands().count()
    }

    /// Sum of all entries. This is the normalizer of the network delay.
    pub fn total(&self) -> f64 {
        self.demands.iter().sum()
    }

    /// New matrix with every demand multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Result<TrafficMatrix, TrafficError> {
        if !(factor.is_finite() && factor >= 0.0) {
            return Err(TrafficError::InvalidScale(factor));
        }
        Ok(Self {
            num_nodes: self.num_nodes,
            demands: self.demands.iter().map(|d| d * factor).collect(),
        })
    }
}

/// Distribution of the demand of each ordered node pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrafficModel {
    /// Every pair gets an integer demand drawn uniformly from `min..=max`.
    Uniform { min: u32, max: u32 },
    /// Every pair has a demand of `demand` with the given probability, and none otherwise.
    Bernoulli { probability: f64, demand: f64 },
    /// Every pair gets a Poisson-distributed demand with the given mean.
    Poisson { mean: f64 },
}

impl Default for TrafficModel {
    fn default() -> Self {
        Self::Bernoulli {
            probability: 0.2,
            demand: 1.0,
        }
    }
}

impl TrafficModel {
    /// Draw a traffic matrix for `num_nodes` nodes. Pairs are visited in row-major order.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        num_nodes: usize,
        rng: &mut R,
    ) -> Result<TrafficMatrix, TrafficError> {
        let mut matrix = TrafficMatrix::new(num_nodes);
        match *self {
            Self::Uniform { min, max } => {
                if min > max {
                    return Err(TrafficError::InvalidModel(*self));
                }
                for (src, dst) in ordered_pairs(num_nodes) {
                    matrix.set(src, dst, rng.gen_range(min..=max) as f64)?;
                }
            }
            Self::Bernoulli {
                probability,
                demand,
            } => {
                if !(0.0..=1.0).contains(&probability) || !(demand.is_finite() && demand >= 0.0) {
                    return Err(TrafficError::InvalidModel(*self));
                }
                for (src, dst) in ordered_pairs(num_nodes) {
                    if rng.gen_bool(probability) {
                        matrix.set(src, dst, demand)?;
                    }
                }
            }
            Self::Poisson { mean } => {
                let dist = Poisson::new(mean).map_err(|_| TrafficError::InvalidModel(*self))?;
                for (src, dst) in ordered_pairs(num_nodes) {
                    let demand: f64 = dist.sample(rng);
                    matrix.set(src, dst, demand)?;
                }
            }
        }
        log::trace!(
            "Generated {} demands with a total of {} packets/s",
            matrix.num_demands(),
            matrix.total()
        );
        Ok(matrix)
    }
}

fn ordered_pairs(n: usize) -> impl Iterator<Item = (NodeId, NodeId)> {
    (0..n).flat_map(move |src| (0..n).filter(move |dst| *dst != src).map(move |dst| (src, dst)))
}

/// Error thrown when constructing or modifying a traffic matrix.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrafficError {
    #[error("Node {0} cannot send traffic to itself")]
    SelfDemand(NodeId),
    #[error("Invalid demand from {0} to {1}: {2}")]
    InvalidDemand(NodeId, NodeId, f64),
    #[error("Node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("Invalid scaling factor: {0}")]
    InvalidScale(f64),
    #[error("Invalid traffic model: {0:?}")]
    InvalidModel(TrafficModel),
    #[error("Expected {num_nodes}x{num_nodes} demands, found {len}")]
    InvalidShape { num_nodes: usize, len: usize },
}
