use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eabridge_api::{BridgeConfig, BridgeServer};
use eabridge_core::OrderType;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "eabridge")]
#[command(about = "HTTP command bridge between order submitters and MetaTrader Expert Advisors")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "EABRIDGE_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge server until Ctrl-C
    Serve {
        /// Path to a TOML config file
        #[arg(short, long, env = "EABRIDGE_CONFIG")]
        config: Option<PathBuf>,

        /// Bind host (overrides config)
        #[arg(long, env = "EABRIDGE_HOST")]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(short, long, env = "EABRIDGE_PORT")]
        port: Option<u16>,

        /// EA id used when requests omit one (overrides config)
        #[arg(long, env = "EABRIDGE_DEFAULT_EA_ID")]
        default_ea_id: Option<String>,

        /// Expire commands older than this many seconds (overrides config)
        #[arg(long, env = "EABRIDGE_TTL")]
        ttl: Option<u64>,
    },

    /// Print the default configuration as TOML
    DefaultConfig,

    /// List the order types accepted by /position/open
    OrderTypes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.log_json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            default_ea_id,
            ttl,
        } => {
            let mut bridge_config = match config {
                Some(path) => BridgeConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => BridgeConfig::default(),
            };
            if let Some(host) = host {
                bridge_config.host = host;
            }
            if let Some(port) = port {
                bridge_config.port = port;
            }
            if let Some(default_ea_id) = default_ea_id {
                bridge_config.default_ea_id = default_ea_id;
            }
            if ttl.is_some() {
                bridge_config.command_ttl_secs = ttl;
            }
            bridge_config.validate()?;

            serve(bridge_config).await?;
        }
        Commands::DefaultConfig => {
            print!("{}", toml::to_string_pretty(&BridgeConfig::default())?);
        }
        Commands::OrderTypes => {
            println!("Accepted order types:");
            for order_type in OrderType::ALL {
                let kind = if order_type.is_pending() {
                    "pending (price required)"
                } else {
                    "market"
                };
                println!("  {:<11} - {}", order_type.as_str(), kind);
            }
        }
    }

    Ok(())
}

async fn serve(config: BridgeConfig) -> Result<()> {
    let server = BridgeServer::new(config);
    let addr = server.start().await?;
    println!("EA bridge listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    tracing::info!("Interrupt received");

    server.shutdown().await?;
    Ok(())
}
