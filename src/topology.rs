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
//! Network topology: an undirected graph whose links carry a capacity, a routing cost and a
//! survival probability, and the builder generating random connected topologies.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    ops::Range,
};

use itertools::Itertools;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    connectivity::{self, UnionFind},
    routing::FlowAssignment,
};

/// Node identifier. The nodes of a topology with `n` nodes are `0..n`.
pub type NodeId = usize;

/// Undirected edge between two distinct nodes, stored with the smaller node first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(NodeId, NodeId)")]
pub struct Edge(NodeId, NodeId);

impl Edge {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// Both endpoints, the smaller one first.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.0, self.1)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.0 == node || self.1 == node
    }
}

impl TryFrom<(NodeId, NodeId)> for Edge {
    type Error = TopologyError;

    fn try_from((a, b): (NodeId, NodeId)) -> Result<Self, Self::Error> {
        if a == b {
            return Err(TopologyError::SelfLoop(a));
        }
        Ok(Self::new(a, b))
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// Attributes of a link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Capacity in bits per second.
    pub capacity: f64,
    /// Routing metric used by the shortest-path computation.
    pub cost: f64,
    /// Probability that the link is operational in a sampled interval.
    pub survival: f64,
}

impl Link {
    pub fn new(capacity: f64, cost: f64, survival: f64) -> Self {
        Self {
            capacity,
            cost,
            survival,
        }
    }

    fn validate(&self) -> Result<(), TopologyError> {
        if !(self.capacity.is_finite() && self.capacity > 0.0) {
            return Err(TopologyError::InvalidCapacity(self.capacity));
        }
        if !(self.cost.is_finite() && self.cost > 0.0) {
            return Err(TopologyError::InvalidCost(self.cost));
        }
        if !(0.0..=1.0).contains(&self.survival) {
            return Err(TopologyError::InvalidSurvival(self.survival));
        }
        Ok(())
    }
}

/// Undirected network with a fixed set of nodes and at most one link per node pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SerializedTopology")]
pub struct Topology {
    num_nodes: usize,
    #[serde(with = "netrel_utils::serde::ordered_map")]
    links: BTreeMap<Edge, Link>,
    /// Neighbors of each node, sorted by node id.
    #[serde(skip)]
    adjacency: Vec<BTreeSet<NodeId>>,
}

/// Type used to deserialize a `Topology` and rebuild (and validate) its adjacency afterwards.
#[derive(Deserialize)]
struct SerializedTopology {
    num_nodes: usize,
    #[serde(with = "netrel_utils::serde::ordered_map")]
    links: BTreeMap<Edge, Link>,
}

impl TryFrom<SerializedTopology> for Topology {
    type Error = TopologyError;

    fn try_from(value: SerializedTopology) -> Result<Self, Self::Error> {
        let mut topo = Topology::new(value.num_nodes);
        for (edge, link) in value.links {
            let (a, b) = edge.endpoints();
            topo.add_link(a, b, link)?;
        }
        Ok(topo)
    }
}

impl Topology {
    /// Create a topology with `num_nodes` nodes and no links.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            links: BTreeMap::new(),
            adjacency: vec![BTreeSet::new(); num_nodes],
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.links.len()
    }

    pub fn nodes(&self) -> Range<NodeId> {
        0..self.num_nodes
    }

    /// Add a link between `a` and `b`. Self-loops, duplicate links, unknown nodes and invalid
    /// link attributes are rejected.
    pub fn add_link(&mut self, a: NodeId, b: NodeId, link: Link) -> Result<Edge, TopologyError> {
        for n in [a, b] {
            if n >= self.num_nodes {
                return Err(TopologyError::UnknownNode(n));
            }
        }
        if a == b {
            return Err(TopologyError::SelfLoop(a));
        }
        let edge = Edge::new(a, b);
        if self.links.contains_key(&edge) {
            return Err(TopologyError::DuplicateEdge(edge));
        }
        link.validate()?;

        self.links.insert(edge, link);
        self.adjacency[a].insert(b);
        self.adjacency[b].insert(a);
        Ok(edge)
    }

    pub fn remove_link(&mut self, edge: Edge) -> Option<Link> {
        let link = self.links.remove(&edge)?;
        let (a, b) = edge.endpoints();
        self.adjacency[a].remove(&b);
        self.adjacency[b].remove(&a);
        Some(link)
    }

    pub fn link(&self, edge: Edge) -> Option<&Link> {
        self.links.get(&edge)
    }

    pub fn contains_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.links.contains_key(&Edge::new(a, b))
    }

    /// Iterate over all links in ascending edge order.
    pub fn links(&self) -> impl Iterator<Item = (Edge, &Link)> + '_ {
        self.links.iter().map(|(e, l)| (*e, l))
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.links.keys().copied()
    }

    /// Iterate over the neighbors of `node` in ascending order, together with the connecting link.
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &Link)> + '_ {
        self.adjacency
            .get(node)
            .into_iter()
            .flatten()
            .filter_map(move |&other| Some((other, self.links.get(&Edge::new(node, other))?)))
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency.get(node).map(BTreeSet::len).unwrap_or_default()
    }

    pub fn is_connected(&self) -> bool {
        connectivity::is_connected(self)
    }

    /// Return an error if the topology is not connected.
    pub fn validate_connected(&self) -> Result<(), TopologyError> {
        let components = connectivity::components(self).num_components();
        if components > 1 {
            Err(TopologyError::Disconnected { components })
        } else {
            Ok(())
        }
    }

    /// Topology with the same nodes, keeping only the links for which `keep` returns `true`.
    /// `keep` is called once per link in ascending edge order.
    pub fn filter_links<F>(&self, mut keep: F) -> Topology
    where
        F: FnMut(Edge, &Link) -> bool,
    {
        let mut topo = Topology::new(self.num_nodes);
        for (edge, link) in self.links() {
            if keep(edge, link) {
                let (a, b) = edge.endpoints();
                topo.links.insert(edge, *link);
                topo.adjacency[a].insert(b);
                topo.adjacency[b].insert(a);
            }
        }
        topo
    }

    /// Copy of the topology with all capacities multiplied by `factor`.
    pub fn with_scaled_capacities(&self, factor: f64) -> Result<Topology, TopologyError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(TopologyError::InvalidScale(factor));
        }
        let mut topo = self.clone();
        topo.links
            .values_mut()
            .for_each(|link| link.capacity *= factor);
        Ok(topo)
    }

    /// Copy of the topology where every link has the survival probability `p`.
    pub fn with_survival(&self, p: f64) -> Result<Topology, TopologyError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(TopologyError::InvalidSurvival(p));
        }
        let mut topo = self.clone();
        topo.links.values_mut().for_each(|link| link.survival = p);
        Ok(topo)
    }

    pub fn mean_capacity(&self) -> Option<f64> {
        self.mean_of(|l| l.capacity)
    }

    pub fn mean_cost(&self) -> Option<f64> {
        self.mean_of(|l| l.cost)
    }

    pub fn mean_survival(&self) -> Option<f64> {
        self.mean_of(|l| l.survival)
    }

    fn mean_of(&self, f: impl Fn(&Link) -> f64) -> Option<f64> {
        if self.links.is_empty() {
            None
        } else {
            Some(self.links.values().map(f).sum::<f64>() / self.links.len() as f64)
        }
    }

    /// All node pairs that are not yet connected by a link, in ascending order.
    pub fn non_adjacent_pairs(&self) -> Vec<Edge> {
        self.nodes()
            .tuple_combinations()
            .map(|(a, b)| Edge::new(a, b))
            .filter(|e| !self.links.contains_key(e))
            .collect()
    }

    /// Add `k` links between node pairs chosen uniformly at random among the non-adjacent pairs.
    /// The attributes of each new link are created by `link`. Returns the added edges in the
    /// order they were added.
    pub fn add_random_links<R, F>(
        &mut self,
        k: usize,
        rng: &mut R,
        mut link: F,
    ) -> Result<Vec<Edge>, TopologyError>
    where
        R: Rng + ?Sized,
        F: FnMut(&mut R) -> Link,
    {
        let mut candidates = self.non_adjacent_pairs();
        if k > candidates.len() {
            return Err(TopologyError::TooManyEdges {
                requested: self.num_edges() + k,
                max: self.num_edges() + candidates.len(),
            });
        }
        candidates.shuffle(rng);
        candidates.truncate(k);
        for edge in candidates.iter() {
            let (a, b) = edge.endpoints();
            let l = link(rng);
            self.add_link(a, b, l)?;
        }
        Ok(candidates)
    }

    /// Dimension the link capacities for the given flows: a link carrying `a` packets per second
    /// gets the capacity `packet_size * a * margin`, and unused links get `packet_size` (i.e., a
    /// service rate of one packet per second).
    pub fn dimension_capacities(
        &mut self,
        flows: &FlowAssignment,
        packet_size: f64,
        margin: f64,
    ) -> Result<(), TopologyError> {
        if !(packet_size.is_finite() && packet_size > 0.0) {
            return Err(TopologyError::InvalidCapacity(packet_size));
        }
        if !(margin.is_finite() && margin > 0.0) {
            return Err(TopologyError::InvalidScale(margin));
        }
        for (edge, link) in self.links.iter_mut() {
            let flow = flows.get(*edge);
            link.capacity = if flow > 0.0 {
                packet_size * flow * margin
            } else {
                packet_size
            };
        }
        Ok(())
    }
}

/// Structure that is built first to make sure that no node is isolated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseStructure {
    /// Ring `0 - 1 - ... - (n-1) - 0`.
    #[default]
    Cycle,
    /// Random recursive tree: every node attaches to a uniformly chosen earlier node of a random
    /// permutation.
    RandomTree,
    /// Minimum spanning tree (Kruskal) of the complete graph with uniformly random weights.
    SpanningTree,
}

/// How survival probabilities are assigned to the links.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurvivalModel {
    /// The same probability for all links.
    Global(f64),
    /// Each link draws its probability uniformly from `[min, max]`.
    Uniform { min: f64, max: f64 },
}

impl Default for SurvivalModel {
    fn default() -> Self {
        Self::Global(0.7)
    }
}

/// Builder for random connected topologies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyBuilder {
    pub num_nodes: usize,
    /// Target number of links. If the base structure already has more links, no links are added.
    pub num_edges: usize,
    pub base: BaseStructure,
    /// Inclusive range of the capacity, in bits per second.
    pub capacity: (u64, u64),
    /// Inclusive range of the routing cost.
    pub cost: (u32, u32),
    pub survival: SurvivalModel,
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self {
            num_nodes: 20,
            num_edges: 25,
            base: BaseStructure::Cycle,
            capacity: (40_000, 70_000),
            cost: (1, 10),
            survival: SurvivalModel::default(),
        }
    }
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_nodes(mut self, num_nodes: usize) -> Self {
        self.num_nodes = num_nodes;
        self
    }

    pub fn num_edges(mut self, num_edges: usize) -> Self {
        self.num_edges = num_edges;
        self
    }

    pub fn base(mut self, base: BaseStructure) -> Self {
        self.base = base;
        self
    }

    pub fn capacity(mut self, min: u64, max: u64) -> Self {
        self.capacity = (min, max);
        self
    }

    pub fn cost(mut self, min: u32, max: u32) -> Self {
        self.cost = (min, max);
        self
    }

    pub fn survival(mut self, survival: SurvivalModel) -> Self {
        self.survival = survival;
        self
    }

    fn validate(&self) -> Result<(), TopologyError> {
        if self.num_nodes == 0 {
            return Err(TopologyError::Empty);
        }
        let (c_min, c_max) = self.capacity;
        if c_min == 0 || c_min > c_max {
            return Err(TopologyError::InvalidRange("capacity", c_min as f64, c_max as f64));
        }
        let (w_min, w_max) = self.cost;
        if w_min == 0 || w_min > w_max {
            return Err(TopologyError::InvalidRange("cost", w_min as f64, w_max as f64));
        }
        match self.survival {
            SurvivalModel::Global(p) if !(0.0..=1.0).contains(&p) => {
                return Err(TopologyError::InvalidSurvival(p))
            }
            SurvivalModel::Uniform { min, max }
                if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min > max =>
            {
                return Err(TopologyError::InvalidRange("survival", min, max))
            }
            _ => {}
        }
        let max = self.num_nodes * (self.num_nodes - 1) / 2;
        if self.num_edges > max {
            return Err(TopologyError::TooManyEdges {
                requested: self.num_edges,
                max,
            });
        }
        Ok(())
    }

    /// Draw the attributes of a new link.
    pub fn random_link<R: Rng + ?Sized>(&self, rng: &mut R) -> Link {
        let capacity = rng.gen_range(self.capacity.0..=self.capacity.1) as f64;
        let cost = rng.gen_range(self.cost.0..=self.cost.1) as f64;
        let survival = match self.survival {
            SurvivalModel::Global(p) => p,
            SurvivalModel::Uniform { min, max } => rng.gen_range(min..=max),
        };
        Link::new(capacity, cost, survival)
    }

    /// Build a random connected topology.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Topology, TopologyError> {
        self.validate()?;
        let n = self.num_nodes;
        let mut topo = Topology::new(n);

        match self.base {
            BaseStructure::Cycle => {
                for a in 0..n {
                    let b = (a + 1) % n;
                    // skip the self-loop for n = 1 and the duplicate for n = 2
                    if a != b && !topo.contains_edge(a, b) {
                        let link = self.random_link(rng);
                        topo.add_link(a, b, link)?;
                    }
                }
            }
            BaseStructure::RandomTree => {
                let mut order = topo.nodes().collect_vec();
                order.shuffle(rng);
                for i in 1..n {
                    let parent = order[rng.gen_range(0..i)];
                    let link = self.random_link(rng);
                    topo.add_link(order[i], parent, link)?;
                }
            }
            BaseStructure::SpanningTree => {
                let weighted = topo
                    .nodes()
                    .tuple_combinations()
                    .map(|(a, b)| (rng.gen::<f64>(), a, b))
                    .collect_vec();
                let mut components = UnionFind::new(n);
                for (_, a, b) in weighted.into_iter().sorted_by(|x, y| x.0.total_cmp(&y.0)) {
                    if components.union(a, b) {
                        let link = self.random_link(rng);
                        topo.add_link(a, b, link)?;
                    }
                }
            }
        }

        let missing = self.num_edges.saturating_sub(topo.num_edges());
        if missing == 0 && topo.num_edges() > self.num_edges {
            log::debug!(
                "Base structure has {} links, exceeding the target of {}",
                topo.num_edges(),
                self.num_edges
            );
        }
        topo.add_random_links(missing, rng, |rng| self.random_link(rng))?;

        topo.validate_connected()?;
        log::debug!(
            "Built topology with {} nodes and {} links",
            topo.num_nodes(),
            topo.num_edges()
        );
        Ok(topo)
    }
}

/// Error thrown when a topology cannot be built or modified.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TopologyError {
    #[error("The topology must have at least one node")]
    Empty,
    #[error("Node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("Self-loop at node {0}")]
    SelfLoop(NodeId),
    #[error("Link {0} already exists")]
    DuplicateEdge(Edge),
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(f64),
    #[error("Invalid cost: {0}")]
    InvalidCost(f64),
    #[error("Invalid survival probability: {0}")]
    InvalidSurvival(f64),
    #[error("Invalid scaling factor: {0}")]
    InvalidScale(f64),
    #[error("Invalid {0} range: [{1}, {2}]")]
    InvalidRange(&'static str, f64, f64),
    #[error("Cannot have {requested} links, at most {max} are possible")]
    TooManyEdges { requested: usize, max: usize },
    #[error("The topology is not connected ({components} components)")]
    Disconnected { components: usize },
}

#[cfg(test)]
mod test {
    use super::*;

    fn link(capacity: f64) -> Link {
        Link::new(capacity, 1.0, 1.0)
    }

    #[test]
    fn add_link_rejects_invalid_links() {
        let mut topo = Topology::new(3);
        assert_eq!(topo.add_link(0, 1, link(1.0)), Ok(Edge::new(0, 1)));
        assert_eq!(
            topo.add_link(1, 0, link(1.0)),
            Err(TopologyError::DuplicateEdge(Edge::new(0, 1)))
        );
        assert_eq!(topo.add_link(2, 2, link(1.0)), Err(TopologyError::SelfLoop(2)));
        assert_eq!(topo.add_link(0, 3, link(1.0)), Err(TopologyError::UnknownNode(3)));
        assert_eq!(
            topo.add_link(0, 2, link(0.0)),
            Err(TopologyError::InvalidCapacity(0.0))
        );
        assert_eq!(
            topo.add_link(0, 2, Link::new(1.0, 1.0, 1.5)),
            Err(TopologyError::InvalidSurvival(1.5))
        );
        assert_eq!(topo.num_edges(), 1);
    }

    #[test]
    fn edges_deserialize_normalized() {
        let edge: Edge = serde_json::from_str("[3,1]").unwrap();
        assert_eq!(edge, Edge::new(1, 3));
        assert_eq!(edge.endpoints(), (1, 3));
        assert_eq!(serde_json::to_string(&edge).unwrap(), "[1,3]");
        assert!(serde_json::from_str::<Edge>("[2,2]").is_err());
    }

    #[test]
    fn neighbors_are_sorted() {
        let mut topo = Topology::new(4);
        topo.add_link(2, 3, link(1.0)).unwrap();
        topo.add_link(2, 0, link(2.0)).unwrap();
        topo.add_link(1, 2, link(3.0)).unwrap();
        let neighbors = topo.neighbors(2).map(|(n, l)| (n, l.capacity)).collect_vec();
        assert_eq!(neighbors, vec![(0, 2.0), (1, 3.0), (3, 1.0)]);
        assert_eq!(topo.degree(2), 3);

        topo.remove_link(Edge::new(0, 2));
        assert_eq!(topo.neighbors(2).map(|(n, _)| n).collect_vec(), vec![1, 3]);
        assert_eq!(topo.neighbors(0).count(), 0);
    }

    #[test]
    fn build_cycle_with_extra_links() {
        let mut rng = StdRng::seed_from_u64(42);
        let topo = TopologyBuilder::new()
            .num_nodes(20)
            .num_edges(25)
            .build(&mut rng)
            .unwrap();
        assert_eq!(topo.num_nodes(), 20);
        assert_eq!(topo.num_edges(), 25);
        assert!(topo.is_connected());
        for i in 0..20 {
            assert!(topo.contains_edge(i, (i + 1) % 20));
        }
        for (_, l) in topo.links() {
            assert!((40_000.0..=70_000.0).contains(&l.capacity));
            assert!((1.0..=10.0).contains(&l.cost));
            assert_eq!(l.survival, 0.7);
        }
    }

    #[test]
    fn build_trees() {
        for base in [BaseStructure::RandomTree, BaseStructure::SpanningTree] {
            let mut rng = StdRng::seed_from_u64(7);
            let topo = TopologyBuilder::new()
                .num_nodes(15)
                .num_edges(14)
                .base(base)
                .build(&mut rng)
                .unwrap();
            assert_eq!(topo.num_edges(), 14);
            assert!(topo.is_connected());
        }
    }

    #[test]
    fn build_small_and_complete() {
        let mut rng = StdRng::seed_from_u64(1);
        let single = TopologyBuilder::new()
            .num_nodes(1)
            .num_edges(0)
            .build(&mut rng)
            .unwrap();
        assert_eq!(single.num_edges(), 0);

        let pair = TopologyBuilder::new()
            .num_nodes(2)
            .num_edges(1)
            .build(&mut rng)
            .unwrap();
        assert_eq!(pair.num_edges(), 1);

        let complete = TopologyBuilder::new()
            .num_nodes(6)
            .num_edges(15)
            .build(&mut rng)
            .unwrap();
        assert_eq!(complete.num_edges(), 15);
        assert!(complete.non_adjacent_pairs().is_empty());

        assert_eq!(
            TopologyBuilder::new()
                .num_nodes(6)
                .num_edges(16)
                .build(&mut rng),
            Err(TopologyError::TooManyEdges {
                requested: 16,
                max: 15
            })
        );
        assert_eq!(
            TopologyBuilder::new().num_nodes(0).build(&mut rng),
            Err(TopologyError::Empty)
        );
    }

    #[test]
    fn per_link_survival() {
        let mut rng = StdRng::seed_from_u64(3);
        let topo = TopologyBuilder::new()
            .survival(SurvivalModel::Uniform { min: 0.5, max: 0.9 })
            .build(&mut rng)
            .unwrap();
        assert!(topo
            .links()
            .all(|(_, l)| (0.5..=0.9).contains(&l.survival)));
    }

    #[test]
    fn scaling_and_means() {
        let mut topo = Topology::new(3);
        topo.add_link(0, 1, Link::new(100.0, 2.0, 0.5)).unwrap();
        topo.add_link(1, 2, Link::new(300.0, 4.0, 1.0)).unwrap();
        assert_eq!(topo.mean_capacity(), Some(200.0));
        assert_eq!(topo.mean_cost(), Some(3.0));
        assert_eq!(topo.mean_survival(), Some(0.75));

        let scaled = topo.with_scaled_capacities(2.0).unwrap();
        assert_eq!(scaled.mean_capacity(), Some(400.0));
        assert_eq!(topo.with_scaled_capacities(0.0), Err(TopologyError::InvalidScale(0.0)));

        let reliable = topo.with_survival(1.0).unwrap();
        assert_eq!(reliable.mean_survival(), Some(1.0));
        assert_eq!(Topology::new(2).mean_capacity(), None);
    }

    #[test]
    fn add_random_links_exhausts_candidates() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut topo = Topology::new(4);
        topo.add_link(0, 1, link(1.0)).unwrap();
        let added = topo
            .add_random_links(5, &mut rng, |_| link(2.0))
            .unwrap();
        assert_eq!(added.len(), 5);
        assert_eq!(topo.num_edges(), 6);
        assert!(added.iter().all(|e| *e != Edge::new(0, 1)));
        assert!(topo
            .add_random_links(1, &mut rng, |_| link(2.0))
            .is_err());
    }

    #[test]
    fn serde_rebuilds_adjacency() {
        let mut topo = Topology::new(3);
        topo.add_link(0, 2, Link::new(10.0, 1.0, 0.9)).unwrap();
        let json = serde_json::to_string(&topo).unwrap();
        let back: Topology = serde_json::from_str(&json).unwrap();
        assert_eq!(back, topo);
        assert_eq!(back.neighbors(2).map(|(n, _)| n).collect_vec(), vec![0]);

        let invalid = r#"{"num_nodes":2,"links":[{"key":[0,0],"val":{"capacity":1.0,"cost":1.0,"survival":1.0}}]}"#;
        assert!(serde_json::from_str::<Topology>(invalid).is_err());
    }
}
