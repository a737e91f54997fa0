// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ChatShell — native shell for the chat web app
//
// Entry point. Initialises logging, loads configuration, and hands over to the
// web view event loop.

mod services;
mod shell;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("ChatShell starting");

    let data_dir = services::data_dir::data_dir();
    let config = services::config::load_or_init(&data_dir);
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "refusing to start with invalid configuration");
        std::process::exit(1);
    }

    if let Err(e) = shell::run(config) {
        tracing::error!(error = %e, "shell failed to start");
        std::process::exit(1);
    }
}
