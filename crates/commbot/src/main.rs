// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commbot - a community chat bot that answers commands with media from
//! partner community walls.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Commbot - community chat bot for VK.
#[derive(Parser, Debug)]
#[command(name = "commbot", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot.
    Serve,
    /// Run diagnostic checks against the object store and the VK API.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
        /// Write the normalized catalog tables into this directory.
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },
    /// Validate the configuration and exit.
    CheckConfig {
        /// Also require the settings `serve` needs (tokens, ids, store location).
        #[arg(long)]
        serve: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match commbot_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            commbot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(errors) = commbot_config::validate_for_serve(&config) {
                commbot_config::render_errors(&errors);
                std::process::exit(1);
            }
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Doctor { plain, dump_dir }) => {
            if let Err(e) = doctor::run_doctor(&config, plain, dump_dir.as_deref()).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig { serve }) => {
            if serve {
                if let Err(errors) = commbot_config::validate_for_serve(&config) {
                    commbot_config::render_errors(&errors);
                    std::process::exit(1);
                }
            }
            println!("commbot: configuration is valid");
        }
        None => {
            println!("commbot: use --help for available commands");
        }
    }
}
