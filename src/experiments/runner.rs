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
//! Module that executes several sweeps in parallel and collects all their points.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;

use super::{ExperimentError, SweepAxis, SweepExperiment, SweepPoint};

/// Points of one finished sweep.
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub axis: SweepAxis,
    pub points: Result<Vec<SweepPoint>, ExperimentError>,
}

/// Run all sweeps in parallel. A progress bar (added to `multi`, if given) advances once per
/// evaluated step. A failing sweep does not stop the others.
pub fn run(sweeps: &[SweepExperiment], multi: Option<&MultiProgress>) -> Vec<SweepResult> {
    let total: usize = sweeps.iter().map(SweepExperiment::len).sum();
    let bar = ProgressBar::new(total as u64);
    let bar = match multi {
        Some(multi) => multi.add(bar),
        None => bar,
    };
    let template = "[{bar:60}] step: {pos:>4}/{len:4}, elapsed: {elapsed}, eta: {eta}";
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style.progress_chars("##-"));
    }
    bar.tick();

    let results = sweeps
        .par_iter()
        .map(|sweep| {
            let points = sweep.run_with(|_| bar.inc(1));
            if let Err(e) = &points {
                log::error!("Sweep over {} failed: {}", sweep.axis(), e);
            }
            SweepResult {
                axis: sweep.axis(),
                points,
            }
        })
        .collect();

    bar.finish();
    results
}
