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
//! Connectivity checks on (sub-)graphs.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{topology::Topology, traffic::TrafficMatrix};

/// Disjoint-set forest with path halving and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
    num_components: usize,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            num_components: n,
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`. Returns `false` if they were already in the same set.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        self.num_components -= 1;
        true
    }

    pub fn same(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }
}

/// Connected components of the topology.
pub fn components(topo: &Topology) -> UnionFind {
    let mut uf = UnionFind::new(topo.num_nodes());
    for edge in topo.edges() {
        let (a, b) = edge.endpoints();
        uf.union(a, b);
    }
    uf
}

/// Whether every node can reach every other node. Graphs with at most one node are connected.
pub fn is_connected(topo: &Topology) -> bool {
    components(topo).num_components() <= 1
}

/// Condition that a sampled subgraph must satisfy for a trial to be counted.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectivityPolicy {
    /// Every pair with a positive demand must be connected.
    #[default]
    DemandPairs,
    /// The whole subgraph must be connected.
    FullGraph,
}

impl ConnectivityPolicy {
    pub fn is_satisfied(&self, topo: &Topology, traffic: &TrafficMatrix) -> bool {
        match self {
            Self::FullGraph => is_connected(topo),
            Self::DemandPairs => {
                let mut uf = components(topo);
                let n = topo.num_nodes();
                traffic
                    .demands()
                    .all(|(src, dst, _)| src < n && dst < n && uf.same(src, dst))
            }
        }
    }
}
