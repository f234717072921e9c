use screencraft::cli::commands::{CliArgs, Commands};
use screencraft::cli::handlers::{handle_health, handle_serve};
use screencraft::util::logging::{init_logging, json_from_env, parse_level, LoggingConfig};
use screencraft::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("screencraft v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Serve(serve_args) => handle_serve(serve_args, args.log_level.as_deref()).await,
        Commands::Health(health_args) => handle_health(health_args).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("SCREENCRAFT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    let base = if json_from_env() {
        LoggingConfig::production()
    } else {
        LoggingConfig::default()
    };

    init_logging(LoggingConfig { level, ..base });
}
