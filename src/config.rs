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

//! Server configuration from command-line flags and environment variables.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// StayFinder API server
///
/// Serves the property-rental marketplace over HTTP. Every flag can also be
/// set through the environment variable shown in its help text.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "stayfinder")]
#[command(about = "Property-rental marketplace API server", long_about = None)]
pub struct Config {
    /// Interface to bind
    #[arg(long, env = "STAYFINDER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// TCP port to listen on
    #[arg(long, env = "STAYFINDER_PORT", default_value_t = 5001)]
    pub port: u16,

    /// Seconds between completion sweeps and notification dispatch
    #[arg(long, env = "STAYFINDER_SWEEP_INTERVAL_SECS", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_interval_secs: u64,

    /// CSV file of listings to import at startup
    ///
    /// Expected header: host,title,description,location,lat,lng,base_rate,
    /// weekly_rate,tax_percent,amenities,cover_photo,images
    #[arg(long, env = "STAYFINDER_SEED", value_name = "FILE")]
    pub seed: Option<PathBuf>,

    /// Default host user id for imported listings without a host column value
    #[arg(long, env = "STAYFINDER_SEED_HOST", default_value_t = 1)]
    pub seed_host: u64,
}

impl Config {
    /// Socket address the server listens on.
    ///
    /// # Errors
    ///
    /// Returns an error if `host` is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        Ok(SocketAddr::new(self.host.parse()?, self.port))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
