use std::fs::File;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use simplelog::{Config, LevelFilter, WriteLogger};

use dox::cli::{self, Cli};
use dox::panic_handler;
use dox::settings;

fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Info)
}

fn init_logging(level: LevelFilter) -> Result<()> {
    WriteLogger::init(
        level,
        Config::default(),
        File::create("dox.log").context("failed to create dox.log")?,
    )?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Settings loading logs, so the logger must exist first. The sink takes
    // every level and the global max level filters.
    let cli_level = cli.log_level().map(parse_level);
    if let Err(err) = init_logging(LevelFilter::Trace) {
        eprintln!("warning: logging disabled: {err:#}");
    }
    log::set_max_level(cli_level.unwrap_or(LevelFilter::Info));

    settings::load_settings();
    if cli_level.is_none() {
        log::set_max_level(parse_level(&settings::get_log_level()));
    }

    panic_handler::initialize_panic_handler();
    info!("Starting dox {}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = cli::execute(cli) {
        error!("{err:#}");
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
