// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use std::process::ExitCode;

use routeros_api::{Config, Connection, Result, RouterConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: routeros-query <command> [=name=value ...]";

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    setup_tracing();

    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    let params: Vec<String> = args.collect();

    let config = Config::from_env();
    tracing::info!(
        "Loaded configuration for {} router(s)",
        config.routers.len()
    );
    if config.routers.is_empty() {
        return ExitCode::FAILURE;
    }

    let mut failed = false;
    for router in &config.routers {
        tracing::info!("  - Router '{}' at {}", router.name, router.address);
        if let Err(e) = run(router, &command, &params) {
            tracing::error!("Router '{}' query failed: {}", router.name, e);
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(router: &RouterConfig, command: &str, params: &[String]) -> Result<()> {
    let mut conn = Connection::open(router)?;
    let args: Vec<&str> = params.iter().map(String::as_str).collect();
    let reply = conn.command(command, &args)?;
    println!("# {}", router.name);
    print!("{reply}");
    conn.disconnect()
}

fn setup_tracing() {
    // RUST_LOG wins, "info" otherwise
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
