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
//! Shortest-path routing of a traffic matrix and aggregation of the per-link flow.
//!
//! Paths are computed with Dijkstra over the link cost. The priority queue settles nodes in
//! ascending `(distance, node id)` order, neighbors are relaxed in ascending node order, and a
//! predecessor is only replaced on a strict improvement of the distance. Among several paths of
//! equal cost, every node thus keeps the predecessor that was settled first, which makes the
//! routing deterministic.

use std::{cmp::Reverse, collections::BTreeMap};

use itertools::Itertools;
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    topology::{Edge, NodeId, Topology},
    traffic::TrafficMatrix,
};

/// Aggregated flow on every link, in packets per second.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowAssignment {
    #[serde(with = "netrel_utils::serde::ordered_map")]
    flows: BTreeMap<Edge, f64>,
    /// Total demand of the routed traffic matrix.
    total_demand: f64,
}

impl FlowAssignment {
    pub fn new(total_demand: f64) -> Self {
        Self {
            flows: BTreeMap::new(),
            total_demand,
        }
    }

    /// Flow on the given edge (zero if nothing is routed over it).
    pub fn get(&self, edge: Edge) -> f64 {
        self.flows.get(&edge).copied().unwrap_or_default()
    }

    /// Iterate over all loaded edges in ascending edge order.
    pub fn iter(&self) -> impl Iterator<Item = (Edge, f64)> + '_ {
        self.flows.iter().map(|(e, f)| (*e, *f))
    }

    pub fn total_demand(&self) -> f64 {
        self.total_demand
    }

    pub fn num_loaded_edges(&self) -> usize {
        self.flows.values().filter(|f| **f > 0.0).count()
    }

    /// The edge carrying the most flow, together with its flow. Ties are resolved towards the
    /// smaller edge.
    pub fn max_loaded_edge(&self) -> Option<(Edge, f64)> {
        self.iter()
            .filter(|(_, f)| *f > 0.0)
            .max_by(|(e1, f1), (e2, f2)| f1.total_cmp(f2).then_with(|| e2.cmp(e1)))
    }

    /// Add `demand` to every edge along `path` (a sequence of nodes).
    pub fn add_path(&mut self, path: &[NodeId], demand: f64) {
        for (a, b) in path.iter().tuple_windows() {
            *self.flows.entry(Edge::new(*a, *b)).or_default() += demand;
        }
    }
}

/// Result of a single-source shortest-path computation.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    source: NodeId,
    dist: Vec<Option<f64>>,
    pred: Vec<Option<NodeId>>,
}

impl ShortestPaths {
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Cost of the shortest path to `target`, or `None` if it is unreachable.
    pub fn distance(&self, target: NodeId) -> Option<f64> {
        self.dist.get(target).copied().flatten()
    }

    /// Nodes on the shortest path from the source to `target`, both included.
    pub fn path_to(&self, target: NodeId) -> Option<Vec<NodeId>> {
        self.distance(target)?;
        let mut path = vec![target];
        let mut current = target;
        while current != self.source {
            current = self.pred[current]?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }
}

/// Dijkstra from `source` over the link costs.
pub fn shortest_paths(topo: &Topology, source: NodeId) -> ShortestPaths {
    let n = topo.num_nodes();
    let mut dist: Vec<Option<f64>> = vec![None; n];
    let mut pred: Vec<Option<NodeId>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut queue: PriorityQueue<NodeId, Reverse<(OrderedFloat<f64>, NodeId)>> =
        PriorityQueue::new();

    if source < n {
        dist[source] = Some(0.0);
        queue.push(source, Reverse((OrderedFloat(0.0), source)));
    }

    while let Some((node, Reverse((OrderedFloat(d), _)))) = queue.pop() {
        settled[node] = true;
        for (next, link) in topo.neighbors(node) {
            if settled[next] {
                continue;
            }
            let alt = d + link.cost;
            if dist[next].map(|old| alt < old).unwrap_or(true) {
                dist[next] = Some(alt);
                pred[next] = Some(node);
                queue.push(next, Reverse((OrderedFloat(alt), next)));
            }
        }
    }

    ShortestPaths { source, dist, pred }
}

/// Route every pair with positive demand over its shortest path and aggregate the flow per link.
/// Fails without returning any flow if a pair cannot be routed.
pub fn route(topo: &Topology, traffic: &TrafficMatrix) -> Result<FlowAssignment, RoutingError> {
    if topo.num_nodes() != traffic.num_nodes() {
        return Err(RoutingError::SizeMismatch {
            topology: topo.num_nodes(),
            matrix: traffic.num_nodes(),
        });
    }

    let mut flows = FlowAssignment::new(traffic.total());
    for (src, demands) in &traffic.demands().group_by(|(src, _, _)| *src) {
        let paths = shortest_paths(topo, src);
        for (_, dst, demand) in demands {
            let path = paths
                .path_to(dst)
                .ok_or(RoutingError::UnreachablePair(src, dst))?;
            flows.add_path(&path, demand);
        }
    }
    Ok(flows)
}

/// Error thrown when routing a traffic matrix.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("No path from {0} to {1}")]
    UnreachablePair(NodeId, NodeId),
    #[error("The traffic matrix has {matrix} nodes, but the topology has {topology}")]
    SizeMismatch { matrix: usize, topology: usize },
}
