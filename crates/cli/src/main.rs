use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "triptt")]
#[command(about = "Triptt CLI — Messenger trip-planning bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a starter config.json.
    Init {
        /// Config file path (default: TRIPTT_CONFIG_PATH or ~/.triptt/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the webhook server (GET/POST /callback).
    Serve {
        /// Config file path (default: TRIPTT_CONFIG_PATH or ~/.triptt/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 8080)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Print the X-Hub-Signature header value for a payload file.
    Sign {
        /// Config file path, used for the app secret when --secret is not given
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// App secret (default: MESSENGER_APP_SECRET or messenger.appSecret)
        #[arg(long)]
        secret: Option<String>,

        /// File containing the raw callback body
        payload: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("triptt {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Sign {
            config,
            secret,
            payload,
        }) => {
            if let Err(e) = run_sign(config, secret, payload) {
                log::error!("sign failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(triptt::config::default_config_path);
    let dir = triptt::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = triptt::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    triptt::gateway::run_gateway(config).await
}

fn run_sign(
    config_path: Option<PathBuf>,
    secret: Option<String>,
    payload: PathBuf,
) -> anyhow::Result<()> {
    let secret = match secret {
        Some(s) => s,
        None => {
            let (config, _) = triptt::config::load_config(config_path)?;
            triptt::config::resolve_app_secret(&config).ok_or_else(|| {
                anyhow::anyhow!("no app secret (pass --secret or set MESSENGER_APP_SECRET)")
            })?
        }
    };
    let body = std::fs::read(&payload)
        .with_context(|| format!("reading {}", payload.display()))?;
    println!("{}", triptt::webhook::sign(&body, &secret));
    Ok(())
}
