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
//! Random link failures.

use rand::Rng;

use crate::topology::Topology;

/// Topology that remains after some links have failed. It has the same nodes as the topology it
/// was sampled from.
pub type Subgraph = Topology;

/// Sample a degraded subgraph: every link survives independently with its survival probability.
/// Links are drawn in ascending edge order.
pub fn sample<R: Rng + ?Sized>(topo: &Topology, rng: &mut R) -> Subgraph {
    topo.filter_links(|_, link| rng.gen_bool(link.survival))
}
