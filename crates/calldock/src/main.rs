// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calldock - phone-intake backend for a field-service plumbing business.
//!
//! This is the binary entry point for the Calldock server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod check;
mod serve;
mod shutdown;

/// Calldock - phone-intake backend for a field-service plumbing business.
#[derive(Parser, Debug)]
#[command(name = "calldock", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook server.
    Serve,
    /// Load and validate the configuration, then print a summary.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match calldock_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            calldock_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(err) = serve::run_serve(config).await {
                eprintln!("calldock serve failed: {err}");
                std::process::exit(1);
            }
        }
        Some(Commands::Check) => check::run_check(&config),
        None => {
            println!("calldock: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }
}
