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
//! Average network delay under a per-link M/M/1 queueing approximation.
//!
//! A link with capacity `c` serves `μ = c / packet_size` packets per second. A link carrying the
//! flow `a < μ` contributes `a / (μ - a)`, and the network delay is the sum of all contributions
//! divided by the total demand. A link with `a ≥ μ` is saturated, and the delay is unbounded.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    routing::FlowAssignment,
    topology::{Edge, Topology},
};

/// Source of link capacities in bits per second.
pub trait Capacities {
    fn capacity(&self, edge: Edge) -> Option<f64>;
}

impl Capacities for Topology {
    fn capacity(&self, edge: Edge) -> Option<f64> {
        self.link(edge).map(|l| l.capacity)
    }
}

impl Capacities for BTreeMap<Edge, f64> {
    fn capacity(&self, edge: Edge) -> Option<f64> {
        self.get(&edge).copied()
    }
}

/// Average per-packet delay of a flow assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delay {
    /// Delay in seconds.
    Finite(f64),
    /// Unbounded, because the flow on the edge reaches its service rate.
    Saturated(Edge),
    /// Unbounded, because there is no demand to average over.
    NoDemand,
}

impl Delay {
    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::Finite(_))
    }

    /// Numeric value of the delay, `f64::INFINITY` if unbounded.
    pub fn value(&self) -> f64 {
        match self {
            Self::Finite(t) => *t,
            Self::Saturated(_) | Self::NoDemand => f64::INFINITY,
        }
    }

    /// Whether the delay is strictly below `t_max`.
    pub fn meets(&self, t_max: f64) -> bool {
        match self {
            Self::Finite(t) => *t < t_max,
            Self::Saturated(_) | Self::NoDemand => false,
        }
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(t) => write!(f, "{:.4}s", t),
            Self::Saturated(e) => write!(f, "unbounded (link {} saturated)", e),
            Self::NoDemand => write!(f, "unbounded (no demand)"),
        }
    }
}

/// Packets per second a link of the given capacity can serve.
pub fn service_rate(capacity: f64, packet_size: f64) -> f64 {
    capacity / packet_size
}

/// Queueing term `a / (μ - a)` of a single link, `None` if the link is saturated.
pub fn edge_delay(flow: f64, service_rate: f64) -> Option<f64> {
    if flow >= service_rate {
        None
    } else {
        Some(flow / (service_rate - flow))
    }
}

/// Network delay `(1 / total_demand) · Σ a / (μ - a)` over all links with flow. A link without a
/// known capacity has a service rate of zero.
pub fn network_delay<C: Capacities + ?Sized>(
    flows: &FlowAssignment,
    capacities: &C,
    packet_size: f64,
    total_demand: f64,
) -> Delay {
    if total_demand <= 0.0 {
        return Delay::NoDemand;
    }
    let mut sum = 0.0;
    for (edge, flow) in flows.iter().filter(|(_, f)| *f > 0.0) {
        let mu = capacities
            .capacity(edge)
            .map(|c| service_rate(c, packet_size))
            .unwrap_or(0.0);
        match edge_delay(flow, mu) {
            Some(d) => sum += d,
            None => return Delay::Saturated(edge),
        }
    }
    Delay::Finite(sum / total_demand)
}

/// Delay model with a fixed mean packet size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayModel {
    /// Mean packet size in bits.
    pub packet_size: f64,
}

impl DelayModel {
    pub fn new(packet_size: f64) -> Self {
        Self { packet_size }
    }

    /// Network delay of `flows`, normalized by the total demand they were routed from.
    pub fn delay<C: Capacities + ?Sized>(&self, flows: &FlowAssignment, capacities: &C) -> Delay {
        network_delay(flows, capacities, self.packet_size, flows.total_demand())
    }
}
