use clap::{Parser, Subcommand};
use relay_core::Mode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "relay", version, about = "Read/write splitting SQL relay")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, env = "RELAY_CONFIG", default_value = "relay.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the routing tier (classify, select node, execute).
    Router,

    /// Run the edge tier (authenticate, filter, forward).
    Gatekeeper,

    /// Validate the configuration and print the resolved topology.
    Check,

    /// Fire writes then reads through a gatekeeper for each mode and report latency.
    Bench {
        /// Gatekeeper `/query` URL.
        #[arg(long, default_value = "http://127.0.0.1:80/query")]
        url: String,

        /// Shared secret sent as `X-API-Key`.
        #[arg(long, env = "RELAY_API_KEY")]
        api_key: String,

        /// Number of writes and of reads per mode.
        #[arg(long, default_value_t = 1000)]
        count: usize,

        /// Pause between requests, in milliseconds.
        #[arg(long, default_value_t = 5)]
        pause_ms: u64,

        /// Modes to run, in order. Defaults to all three.
        #[arg(long, value_delimiter = ',')]
        modes: Vec<Mode>,

        /// Per-request timeout in seconds.
        #[arg(long, default_value_t = 20)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Router => commands::router::run(&cli.config).await?,
        Command::Gatekeeper => commands::gatekeeper::run(&cli.config).await?,
        Command::Check => commands::check::run(&cli.config)?,
        Command::Bench {
            url,
            api_key,
            count,
            pause_ms,
            modes,
            timeout_secs,
        } => {
            let options = commands::bench::BenchOptions {
                url,
                api_key,
                count,
                pause: std::time::Duration::from_millis(pause_ms),
                modes: if modes.is_empty() { Mode::ALL.to_vec() } else { modes },
                timeout: std::time::Duration::from_secs(timeout_secs),
            };
            commands::bench::run(options).await?
        }
    }

    Ok(())
}
