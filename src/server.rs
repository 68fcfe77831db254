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

//! HTTP server runtime and background maintenance.

use crate::api::router;
use crate::config::Config;
use crate::marketplace::Marketplace;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal::{self, ctrl_c};
use tokio::task::{self, JoinHandle};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub completed: usize,
    pub dispatched: usize,
}

/// Completes past stays, then hands every queued notification to delivery.
///
/// Delivery is a log line; email and push transports live elsewhere.
pub fn run_maintenance(marketplace: &Marketplace) -> MaintenanceReport {
    let completed = marketplace.sweep_completions_now().len();

    let notifications = marketplace.drain_notifications();
    for notification in &notifications {
        info!(
            recipient = %notification.recipient,
            kind = ?notification.kind,
            property = %notification.property_id,
            title = %notification.title,
            "notification dispatched"
        );
    }

    MaintenanceReport {
        completed,
        dispatched: notifications.len(),
    }
}

/// Runs [`run_maintenance`] every `period` until the task is aborted.
///
/// Each pass takes calendar and booking locks, so it runs on the blocking pool.
pub fn spawn_maintenance(marketplace: Arc<Marketplace>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let pass = Arc::clone(&marketplace);
            match task::spawn_blocking(move || run_maintenance(&pass)).await {
                Ok(report) if report != MaintenanceReport::default() => {
                    info!(
                        completed = report.completed,
                        dispatched = report.dispatched,
                        "maintenance pass finished"
                    );
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "maintenance pass failed"),
            }
        }
    })
}

/// Serves the API until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address is invalid, the port cannot be bound,
/// or the server fails while running.
pub async fn serve(config: &Config, marketplace: Arc<Marketplace>) -> io::Result<()> {
    let address = config
        .bind_addr()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let listener = TcpListener::bind(address).await?;
    info!(%address, "server listening");

    let maintenance = spawn_maintenance(Arc::clone(&marketplace), config.sweep_interval());

    let result = axum::serve(listener, router(marketplace))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    maintenance.abort();
    info!("server stopped");
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
