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
//! Properties that must hold on randomly generated networks.

use rand::prelude::*;

use netrel_utils::stats::normal_quantile;

use crate::{
    analyzer::{estimate, Analyzer, ReliabilityEstimate},
    connectivity::ConnectivityPolicy,
    routing::route,
    topology::{BaseStructure, SurvivalModel, Topology, TopologyBuilder},
    traffic::{TrafficMatrix, TrafficModel},
};

const PACKET_SIZE: f64 = 1000.0;

fn network(seed: u64, base: BaseStructure) -> (Topology, TrafficMatrix) {
    let mut rng = StdRng::seed_from_u64(seed);
    let topo = TopologyBuilder::new()
        .num_nodes(10)
        .num_edges(14)
        .base(base)
        .survival(SurvivalModel::Uniform { min: 0.6, max: 0.95 })
        .build(&mut rng)
        .unwrap();
    let traffic = TrafficModel::Bernoulli {
        probability: 0.3,
        demand: 2.0,
    }
    .generate(10, &mut rng)
    .unwrap();
    (topo, traffic)
}

#[test]
fn baseline_routing_never_fails() {
    for seed in 0..30 {
        for base in [
            BaseStructure::Cycle,
            BaseStructure::RandomTree,
            BaseStructure::SpanningTree,
        ] {
            let (topo, traffic) = network(seed, base);
            assert!(topo.is_connected());
            let flows = route(&topo, &traffic).unwrap();
            assert_eq!(flows.total_demand(), traffic.total());
        }
    }
}

#[test]
fn estimate_is_a_probability() {
    for seed in 0..10 {
        let (topo, traffic) = network(seed, BaseStructure::Cycle);
        for t_max in [0.01, 0.1, 1.0] {
            for policy in [ConnectivityPolicy::DemandPairs, ConnectivityPolicy::FullGraph] {
                let est = estimate(
                    &topo,
                    &traffic,
                    t_max,
                    PACKET_SIZE,
                    policy,
                    100,
                    &mut StdRng::seed_from_u64(seed),
                );
                assert!((0.0..=1.0).contains(&est.reliability()));
                assert!(est.successes <= est.valid_trials);
                assert!(est.valid_trials <= est.iterations);
            }
        }
    }
}

#[test]
fn full_graph_policy_is_stricter() {
    let (topo, traffic) = network(4, BaseStructure::SpanningTree);
    let run = |policy| {
        estimate(
            &topo,
            &traffic,
            0.5,
            PACKET_SIZE,
            policy,
            2000,
            &mut StdRng::seed_from_u64(4),
        )
    };
    let demand_pairs = run(ConnectivityPolicy::DemandPairs);
    let full_graph = run(ConnectivityPolicy::FullGraph);
    // same samples, and every fully connected subgraph connects all demand pairs
    assert!(full_graph.valid_trials <= demand_pairs.valid_trials);
}

#[test]
fn fixed_seed_is_deterministic() {
    let (topo, traffic) = network(7, BaseStructure::Cycle);
    let run = || -> ReliabilityEstimate {
        estimate(
            &topo,
            &traffic,
            0.5,
            PACKET_SIZE,
            ConnectivityPolicy::DemandPairs,
            1000,
            &mut StdRng::seed_from_u64(1234),
        )
    };
    let first = run();
    let second = run();
    assert_eq!(
        (first.successes, first.valid_trials),
        (second.successes, second.valid_trials)
    );
    assert_eq!(first, second);

    let mut analyzer = Analyzer::new(topo, traffic, 0.5, PACKET_SIZE).unwrap();
    analyzer.set_num_samples(999);
    analyzer.set_workers(4).unwrap();
    analyzer.set_seed(99);
    assert_eq!(analyzer.analyze().estimate, analyzer.analyze().estimate);
}

#[test]
fn more_capacity_is_not_less_reliable() {
    const ITERATIONS: usize = 20_000;
    let (topo, traffic) = network(11, BaseStructure::Cycle);
    let traffic = traffic.scaled(10.0).unwrap();

    let run = |scale: f64| {
        let topo = topo.with_scaled_capacities(scale).unwrap();
        estimate(
            &topo,
            &traffic,
            0.5,
            PACKET_SIZE,
            ConnectivityPolicy::DemandPairs,
            ITERATIONS,
            &mut StdRng::seed_from_u64(5),
        )
    };
    let base = run(1.0);
    let doubled = run(2.0);
    eprintln!("scale 1: {}\nscale 2: {}", base, doubled);

    let z = normal_quantile(0.99).unwrap();
    let std_err = |p: f64, n: usize| (p * (1.0 - p) / n.max(1) as f64).sqrt();
    let margin = z
        * (std_err(base.reliability(), base.valid_trials).powi(2)
            + std_err(doubled.reliability(), doubled.valid_trials).powi(2))
        .sqrt();
    assert!(doubled.reliability() + margin >= base.reliability());
}
