use std::net::SocketAddr;
use std::time::Duration;

use broadside::{init_logging, server, EngineConfig, GameService, ServerConfig};
use clap::Parser;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    /// Run the game server.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        push_bind: SocketAddr,
        #[arg(long, default_value = "0.0.0.0:8081")]
        rpc_bind: SocketAddr,
        #[arg(long, default_value_t = 700, help = "Pause between bot shots in milliseconds")]
        bot_delay_ms: u64,
        #[arg(long, help = "Fix RNG seed for reproducible bot games (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            push_bind,
            rpc_bind,
            bot_delay_ms,
            seed,
        } => {
            if let Some(s) = seed {
                log::info!("using fixed seed {}", s);
            }
            let engine = EngineConfig {
                bot_shot_delay: Duration::from_millis(bot_delay_ms),
                seed,
                ..EngineConfig::default()
            };
            let config = ServerConfig {
                push_bind,
                rpc_bind,
                engine,
            };
            let service = GameService::new(config.engine.clone());
            server::run(config, service).await?;
        }
    }
    Ok(())
}
