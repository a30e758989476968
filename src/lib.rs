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
//! Library for estimating the delay and reliability of capacitated networks with random link
//! failures.

pub mod analyzer;
pub mod config;
pub mod connectivity;
pub mod delay;
pub mod experiments;
pub mod failure;
pub mod routing;
pub mod topology;
pub mod traffic;
pub mod util;

#[cfg(test)]
mod test;

pub mod prelude {
    pub use super::{
        analyzer::{estimate, AnalysisResult, Analyzer, ReliabilityEstimate},
        config::ExperimentConfig,
        connectivity::ConnectivityPolicy,
        delay::{Delay, DelayModel},
        experiments::{SweepAxis, SweepExperiment, SweepPoint},
        routing::{route, FlowAssignment},
        topology::{Edge, Link, NodeId, Topology, TopologyBuilder},
        traffic::{TrafficMatrix, TrafficModel},
    };
}
