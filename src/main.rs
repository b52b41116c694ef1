mod cli;

use std::path::Path;

use camerpi::config::Config;
use clap::Parser;
use cli::{Args, Command};

/// Set up env_logger; `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Load config. An explicit --config file must load; a broken default file
/// only produces a warning.
fn load_config(explicit: Option<&Path>) -> Config {
    match explicit {
        Some(path) => match Config::load_from(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => match Config::load() {
            Ok(c) => c,
            Err(e) => {
                log::warn!("{}", e);
                log::warn!("Using default settings.");
                Config::default()
            }
        },
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref());

    match &args.command {
        Command::Focus(focus) => cli::run_focus(focus, &config),
        Command::Still(still) => cli::run_still(still, &config),
        Command::Timelapse(timelapse) => cli::run_timelapse(timelapse, &config),
        Command::List { action } => {
            if let Err(e) = cli::list(action.as_ref(), &config) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Command::Config { action } => {
            cli::handle_config_action(action, &config, args.config.as_deref())
        }
    }
}
