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
    config::ExperimentConfig,
    experiments::runner,
    topology::SurvivalModel,
    util,
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// JSON file describing the experiment. Uses the default experiment if omitted.
    #[arg(short, long)]
    config: Option<String>,
    /// Overwrite the seed of the experiment.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Overwrite the number of Monte-Carlo samples.
    #[arg(short, long)]
    num_samples: Option<usize>,
    /// Overwrite the number of worker threads.
    #[arg(short, long)]
    workers: Option<usize>,
    /// Overwrite the delay threshold in seconds.
    #[arg(short, long)]
    t_max: Option<f64>,
    /// Use the same survival probability for every link.
    #[arg(short = 'p', long)]
    survival: Option<f64>,
    /// Also run the sweeps of the experiment.
    #[arg(long)]
    sweeps: bool,
    /// Print the results as JSON.
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
    if let Some(t_max) = args.t_max {
        config.t_max = t_max;
    }
    if let Some(p) = args.survival {
        config.topology.survival = SurvivalModel::Global(p);
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (topology, traffic) = config
        .build_network(&mut rng)
        .context("Cannot build the network")?;
    let analyzer = config
        .analyzer(topology.clone(), traffic.clone())
        .context("Cannot set up the analysis")?;
    log::info!("Baseline delay: {}", analyzer.baseline_delay());

    let result = analyzer.analyze();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{result}");
    }

    if args.sweeps {
        let sweeps = config
            .sweep_experiments(&topology, &traffic)
            .context("Cannot set up the sweeps")?;
        for sweep in runner::run(&sweeps, Some(&multi)) {
            let points = sweep
                .points
                .with_context(|| format!("Sweep over {} failed", sweep.axis))?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else {
                points.iter().for_each(|p| println!("{p}"));
            }
        }
    }

    Ok(())
}
