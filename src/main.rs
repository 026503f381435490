//! ch9121 - CH9121 UART-to-Ethernet bridge configuration tool
//!
//! Reads and writes the chip's network and UART settings over its serial
//! configuration interface.
//!
//! # Architecture
//!
//! All device access goes through `ch9121-core`, which only needs a byte
//! transport, an output pin for CFG0 and a delay source. Backends provide
//! those:
//! - **serial** - a USB serial adapter, with CFG0 on RTS/DTR or a Linux
//!   GPIO line
//! - **dummy** - an in-memory emulator
//!
//! so the same `show`, `get` and `set` implementations run on every backend.

mod backends;
mod cli;
mod commands;

use ch9121_core::{Port, SessionConfig};
use clap::Parser;
use cli::{Cli, Commands};
use commands::Action;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = session_config(&cli);
    log::debug!("Session config: {:?}", config);

    match &cli.command {
        Commands::Show { backend } => backends::run_with_backend(backend, config, &Action::Show),
        Commands::Get {
            backend,
            setting,
            port,
        } => {
            let port = Port::from_number(*port).ok_or("Port must be 1 or 2")?;
            let action = Action::Get {
                setting: *setting,
                port,
            };
            backends::run_with_backend(backend, config, &action)
        }
        Commands::Set { backend, args } => {
            backends::run_with_backend(backend, config, &Action::Set(args))
        }
        Commands::ListBackends => {
            commands::list_backends();
            Ok(())
        }
    }
}

/// Map the global timing flags onto a session configuration
fn session_config(cli: &Cli) -> SessionConfig {
    let timeout = match cli.timeout_ms {
        0 => None,
        ms => Some(ms),
    };

    SessionConfig::default()
        .with_settle_ms(cli.settle_ms)
        .with_poll_interval_ms(cli.poll_ms)
        .with_response_timeout_ms(timeout)
}
