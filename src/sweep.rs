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
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use rand::prelude::*;

use netrel::{
    config::{ExperimentConfig, SweepConfig},
    experiments::{runner, SweepAxis},
    util,
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Parameter to vary: `traffic_scale`, `capacity_scale` or `added_edges`.
    #[arg(short, long)]
    axis: SweepAxis,
    /// First value of the sweep.
    #[arg(long, default_value_t = 1.0)]
    start: f64,
    /// Last value of the sweep.
    #[arg(long, default_value_t = 3.0)]
    end: f64,
    /// Number of evenly spaced steps from `start` to `end`.
    #[arg(long, default_value_t = 9)]
    steps: usize,
    /// JSON file describing the network. Uses the default experiment if omitted.
    #[arg(short, long)]
    config: Option<String>,
    /// Overwrite the seed of the experiment.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Overwrite the number of Monte-Carlo samples per step.
    #[arg(short, long)]
    num_samples: Option<usize>,
    /// Overwrite the number of worker threads.
    #[arg(short, long)]
    workers: Option<usize>,
    /// Print the points as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let multi = util::init_logging().map_err(|e| anyhow!("Cannot initialize logging: {e}"))?;
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_file(path)
            .with_context(|| format!("Cannot load the experiment from {path}"))?,
        None => ExperimentConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(num_samples) = args.num_samples {
        config.num_samples = Some(num_samples);
    }
    if let Some(workers) = args.workers {
        config.workers = Some(workers);
    }
    config.sweeps = vec![SweepConfig {
        axis: args.axis,
        start: args.start,
        end: args.end,
        steps: args.steps,
    }];

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (topology, traffic) = config
        .build_network(&mut rng)
        .context("Cannot build the network")?;

    let sweeps = config
        .sweep_experiments(&topology, &traffic)
        .context("Cannot set up the sweep")?;
    for sweep in runner::run(&sweeps, Some(&multi)) {
        let points = sweep
            .points
            .with_context(|| format!("Sweep over {} failed", sweep.axis))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&points)?);
        } else {
            println!("{},reliability,valid_trials,successes,baseline_delay", sweep.axis);
            for p in points {
                println!(
                    "{},{},{},{},{}",
                    p.value,
                    p.estimate.reliability(),
                    p.estimate.valid_trials,
                    p.estimate.successes,
                    p.baseline_delay.value()
                );
            }
        }
    }

    Ok(())
}
