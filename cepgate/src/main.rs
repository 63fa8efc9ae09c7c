use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cepgate::api::{ApiServer, ApiServerConfig};
use cepgate::bootstrap::build_lookup_service;
use cepgate::AppConfig;

#[derive(Parser)]
#[command(name = "cepgate")]
#[command(about = "Tiered postal-code (CEP) lookup service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Tier selection shared by every command
#[derive(Args)]
struct TierArgs {
    /// Keep the durable tier in process memory (ignored when NEO4J_URI is set)
    #[arg(long)]
    memory_store: bool,

    /// Disable the fast cache tier
    #[arg(long)]
    no_cache: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind address
        #[arg(long, env = "CEPGATE_HOST")]
        host: Option<String>,

        /// Bind port
        #[arg(short, long, env = "CEPGATE_PORT")]
        port: Option<u16>,

        #[command(flatten)]
        tiers: TierArgs,
    },

    /// Resolve a single postal code and print the response
    Lookup {
        /// Postal code, e.g. 01001000
        cep: String,

        #[command(flatten)]
        tiers: TierArgs,
    },
}

impl TierArgs {
    fn apply(&self, config: &mut AppConfig) {
        config.memory_store |= self.memory_store;
        if self.no_cache {
            config.cache_enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "cepgate=info,cepgate_store=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;

    match cli.command {
        Commands::Serve { host, port, tiers } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            tiers.apply(&mut config);

            let lookup = Arc::new(build_lookup_service(&config).await?);
            let server = ApiServer::new(ApiServerConfig::from(&config), lookup);
            server.start().await?;
        }

        Commands::Lookup { cep, tiers } => {
            tiers.apply(&mut config);

            let lookup = build_lookup_service(&config).await?;
            match lookup.resolve(&cep).await {
                Ok(resolved) => {
                    println!("{}", serde_json::to_string_pretty(&resolved)?);
                }
                Err(e) => {
                    eprintln!("{} {}", e.status_code().as_u16(), e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
