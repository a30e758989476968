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
//! A single Monte-Carlo trial: sample failures, check connectivity, route, and measure the delay.

use rand::Rng;

use crate::{
    connectivity::ConnectivityPolicy,
    delay::{Delay, DelayModel},
    failure::{self, Subgraph},
    routing::{self, FlowAssignment, RoutingError},
    topology::Topology,
    traffic::TrafficMatrix,
};

/// Classification of a trial.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    /// The sampled subgraph violates the connectivity policy. The trial is not counted.
    Disconnected,
    /// A pair could not be routed although the connectivity check passed. The trial is not
    /// counted.
    Unroutable(RoutingError),
    /// The delay is below the threshold.
    Success(f64),
    /// The delay reaches the threshold, or is unbounded.
    Violation(Delay),
}

impl TrialOutcome {
    /// Whether the trial counts towards the valid trials.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Violation(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Everything computed during one trial. Only lives for a single iteration.
#[derive(Debug, Clone)]
pub struct Trial {
    pub subgraph: Subgraph,
    pub connected: bool,
    pub flows: Option<FlowAssignment>,
    pub delay: Option<Delay>,
    pub outcome: TrialOutcome,
}

/// Read-only inputs shared by all trials of an estimate.
#[derive(Debug, Clone, Copy)]
pub struct TrialSetup<'a> {
    pub topology: &'a Topology,
    pub traffic: &'a TrafficMatrix,
    pub delay_model: DelayModel,
    pub t_max: f64,
    pub policy: ConnectivityPolicy,
}

impl<'a> TrialSetup<'a> {
    /// Perform one trial with the given random source.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Trial {
        let subgraph = failure::sample(self.topology, rng);

        if !self.policy.is_satisfied(&subgraph, self.traffic) {
            return Trial {
                subgraph,
                connected: false,
                flows: None,
                delay: None,
                outcome: TrialOutcome::Disconnected,
            };
        }

        let flows = match routing::route(&subgraph, self.traffic) {
            Ok(flows) => flows,
            Err(e) => {
                log::trace!("Trial is unroutable: {}", e);
                return Trial {
                    subgraph,
                    connected: true,
                    flows: None,
                    delay: None,
                    outcome: TrialOutcome::Unroutable(e),
                };
            }
        };

        let delay = self.delay_model.delay(&flows, &subgraph);
        let outcome = match delay {
            Delay::Finite(t) if delay.meets(self.t_max) => TrialOutcome::Success(t),
            _ => TrialOutcome::Violation(delay),
        };

        Trial {
            subgraph,
            connected: true,
            flows: Some(flows),
            delay: Some(delay),
            outcome,
        }
    }
}

#[cfg(test)]
mod test {
    use rand::prelude::*;

    use super::*;
    use crate::topology::{Edge, Link};

    fn square(survival: f64) -> Topology {
        let mut topo = Topology::new(4);
        for i in 0..4 {
            topo.add_link(i, (i + 1) % 4, Link::new(10_000.0, 1.0, survival))
                .unwrap();
        }
        topo
    }

    fn demand(src: usize, dst: usize, d: f64) -> TrafficMatrix {
        let mut m = TrafficMatrix::new(4);
        m.set(src, dst, d).unwrap();
        m
    }

    #[test]
    fn successful_trial() {
        let topo = square(1.0);
        let traffic = demand(0, 2, 5.0);
        let setup = TrialSetup {
            topology: &topo,
            traffic: &traffic,
            delay_model: DelayModel::new(1000.0),
            t_max: 0.5,
            policy: ConnectivityPolicy::DemandPairs,
        };
        let trial = setup.run(&mut StdRng::seed_from_u64(0));
        assert!(trial.connected);
        assert_eq!(trial.outcome, TrialOutcome::Success(0.4));
        let flows = trial.flows.unwrap();
        assert_eq!(flows.get(Edge::new(0, 1)), 5.0);
        assert_eq!(flows.get(Edge::new(1, 2)), 5.0);
        assert_eq!(flows.get(Edge::new(2, 3)), 0.0);
    }

    #[test]
    fn violation_and_disconnection() {
        let topo = square(1.0);
        let traffic = demand(0, 2, 5.0);
        let mut setup = TrialSetup {
            topology: &topo,
            traffic: &traffic,
            delay_model: DelayModel::new(1000.0),
            t_max: 0.4,
            policy: ConnectivityPolicy::DemandPairs,
        };
        let trial = setup.run(&mut StdRng::seed_from_u64(0));
        assert_eq!(trial.outcome, TrialOutcome::Violation(Delay::Finite(0.4)));
        assert!(trial.outcome.is_valid());

        let broken = square(0.0);
        setup.topology = &broken;
        let trial = setup.run(&mut StdRng::seed_from_u64(0));
        assert!(!trial.connected);
        assert_eq!(trial.outcome, TrialOutcome::Disconnected);
        assert!(!trial.outcome.is_valid());
    }

    #[test]
    fn saturated_trial_is_a_violation() {
        let topo = square(1.0);
        let traffic = demand(0, 1, 10.0);
        let setup = TrialSetup {
            topology: &topo,
            traffic: &traffic,
            delay_model: DelayModel::new(1000.0),
            t_max: 100.0,
            policy: ConnectivityPolicy::FullGraph,
        };
        let trial = setup.run(&mut StdRng::seed_from_u64(0));
        assert_eq!(
            trial.outcome,
            TrialOutcome::Violation(Delay::Saturated(Edge::new(0, 1)))
        );
    }
}
