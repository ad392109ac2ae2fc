//! wp-router
//!
//! Fronts a WordPress installation running on a function-as-a-service
//! platform.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  WP-ROUTER                   │
//!                       │                                              │
//!   Platform request    │  ┌────────┐   ┌──────────┐   ┌───────────┐  │
//!   ────────────────────┼─▶│  http  │──▶│ routing  │──▶│ dispatch  │  │
//!                       │  │ server │   │ resolver │   │           │  │
//!                       │  └────────┘   └──────────┘   └─────┬─────┘  │
//!                       │                                    │        │
//!                       │          ┌────────────┬────────────┤        │
//!                       │          ▼            ▼            ▼        │
//!   403 / 302 / 500     │       reject      redirect     script  ─────┼──▶ PHP executor
//!   ◀───────────────────┼──                 to bucket    hand-off     │
//!                       │                                              │
//!                       │  config · health · observability · error    │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use wp_router::lifecycle::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "wp-router")]
#[command(about = "Request router for WordPress on a serverless runtime", long_about = None)]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration
    #[arg(short, long)]
    bind: Option<String>,

    /// Run the startup health checks and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let options = StartupOptions {
        config_path: cli.config,
        bind_address: cli.bind,
        check_only: cli.check,
    };

    match lifecycle::run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "wp-router failed");
            eprintln!("wp-router: {e}");
            ExitCode::FAILURE
        }
    }
}
