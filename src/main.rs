use clap::Parser;
use formfit::cli::{Cli, Commands};
use formfit::config::Config;
use formfit::gateway::GatewayServer;
use formfit::logging;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(opts) => {
            info!("Starting FormFit gateway server");
            let config = Config::load(opts.config.as_deref())?;
            let server = GatewayServer::start(config, opts).await?;
            server.run_until_shutdown().await?;
        }
        Commands::Detect(opts) => {
            formfit::cli::run_detect(&opts)?;
        }
        Commands::Fit(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            formfit::cli::run_fit(&config, &opts)?;
        }
        Commands::Config(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            match opts.action {
                formfit::cli::ConfigAction::Show => {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                formfit::cli::ConfigAction::Validate => {
                    formfit::config::validate_config_object(&config)?;
                    let snapshot = serde_json::to_value(&config)?;
                    let hash = formfit::config::resolve_config_snapshot_hash(&snapshot);
                    info!("Configuration is valid (snapshot {hash})");
                }
                formfit::cli::ConfigAction::Init => {
                    Config::write_default(opts.config.as_deref().unwrap_or("formfit.json"))?;
                    info!("Configuration file created");
                }
            }
        }
        Commands::Version => {
            println!("formfit {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
