// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use fundflow::{cli, commands, config};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let settings = config::load(matches.get_one::<String>("config").map(Path::new))?;

    match matches.subcommand() {
        Some(("flows", sub)) => commands::flows::handle(&settings, sub)?,
        Some(("compare", sub)) => commands::compare::handle(&settings, sub)?,
        Some(("settings", _)) => {
            println!("Settings file: {}", config::config_path()?.display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
