use clap::Parser;
use passdeck::cli::commands::Cli;
use passdeck::cli::handlers;
use passdeck::io::{config_io, logging};

fn main() {
    let cli = Cli::parse();

    // The filter comes from the config file, so read it before anything logs.
    let config_path = cli.config.clone().unwrap_or_else(config_io::default_config_path);
    let filter = config_io::read_config(&config_path)
        .map(|c| c.log.filter)
        .unwrap_or_else(|_| "warn".to_string());
    logging::init_logging(&filter);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
