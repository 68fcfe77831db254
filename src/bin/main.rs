// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use stayfinder::seed::import_listings;
use stayfinder::{Config, Marketplace, UserId, server};
use std::fs::File;
use std::io::BufReader;
use std::process;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LOG_FILTER: &str = "stayfinder=info";

#[tokio::main]
async fn main() {
    let config = Config::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    fmt().with_env_filter(filter).init();

    let marketplace = Arc::new(Marketplace::new());

    if let Some(path) = &config.seed {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot open seed file");
                process::exit(1);
            }
        };
        match import_listings(&marketplace, UserId(config.seed_host), BufReader::new(file)) {
            Ok(summary) => info!(
                path = %path.display(),
                imported = summary.imported,
                skipped = summary.skipped,
                "seed listings loaded"
            ),
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot read seed file");
                process::exit(1);
            }
        }
    }

    if let Err(e) = server::serve(&config, marketplace).await {
        error!(error = %e, "server error");
        process::exit(1);
    }
}
