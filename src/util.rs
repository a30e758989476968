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
//! Utility module collection of functions

use std::path::Path;

use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

/// Configuration file read by [`init_logging`] if it exists in the working directory.
pub const LOG_CONFIG: &str = "log4rs.yml";

/// Initialize logging. If `log4rs.yml` exists, it configures `log4rs`. Otherwise, log messages
/// are formatted by `pretty_env_logger` (configured with `RUST_LOG`) and routed through the
/// returned `MultiProgress`, such that they do not interfere with progress bars.
pub fn init_logging() -> Result<MultiProgress, Box<dyn std::error::Error>> {
    let multi = MultiProgress::new();
    if Path::new(LOG_CONFIG).exists() {
        log4rs::init_file(LOG_CONFIG, Default::default())?;
    } else {
        let mut builder = pretty_env_logger::formatted_builder();
        if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }
        let logger = builder.build();
        let level = logger.filter();
        LogWrapper::new(multi.clone(), logger).try_init()?;
        log::set_max_level(level);
    }
    Ok(multi)
}

/// Number of worker threads used for the analysis.
pub fn num_workers() -> usize {
    num_cpus::get().max(1)
}
