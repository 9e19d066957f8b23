use clap::Parser;

use ephemera::cli::{Cli, Commands};
use ephemera::config::{get_config, init_config_from};
use ephemera::errors::EphemeraError;
use ephemera::runtime::modes;
use ephemera::system::init_logging;

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_from(&cli.config);

    let config = get_config();

    // guard 需要存活到进程结束
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => modes::run_server().await,
        cmd => modes::run_cli(cmd).await,
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        match e.downcast_ref::<EphemeraError>() {
            Some(err) => eprintln!("{}", err.format_colored()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}
