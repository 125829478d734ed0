use dxformat::cli::commands::{CliArgs, Commands};
use dxformat::cli::handlers::{handle_find, handle_formats, handle_show};
use dxformat::format::registry;
use dxformat::util::logging::{self, parse_level, LoggingConfig};
use dxformat::{DxformatConfig, VERSION};

use clap::Parser;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("dxformat v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let config = DxformatConfig::default();
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    debug!("{}", config);

    let registry = registry::shared();
    let exit_code = match &args.command {
        Commands::Find(find_args) => handle_find(find_args, registry),
        Commands::Show(show_args) => handle_show(show_args, registry, &config),
        Commands::Formats(formats_args) => handle_formats(formats_args, registry),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let config = if let Some(level_str) = &args.log_level {
        logging::config_from_env(Some(parse_level(level_str)))
    } else if args.verbose {
        LoggingConfig::development()
    } else if args.quiet {
        logging::config_from_env(Some(Level::ERROR))
    } else {
        logging::config_from_env(None)
    };

    logging::init_logging(config);
}
