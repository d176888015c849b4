use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use std::sync::Arc;
use voxgate::activity::{InboundEvent, OutboundCommand};
use voxgate::Adapter;

#[derive(Parser)]
#[command(name = "voxgate")]
#[command(about = "Voxgate: voice assistant webhook adapter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook adapter until Ctrl+C / SIGTERM.
    Serve {
        /// Config file path (default: VOXGATE_CONFIG_PATH or ~/.voxgate/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from VOXGATE_PORT, config, or 15152)
        #[arg(long, short)]
        port: Option<u16>,

        /// Answer every inbound event with a Note naming its intent (demo consumer).
        #[arg(long)]
        echo: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let default_filter = match cli.command {
        Some(Commands::Serve { .. }) => "info",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match cli.command {
        Some(Commands::Version) => {
            println!("voxgate {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port, echo }) => {
            if let Err(e) = run_serve(config, port, echo).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
    echo: bool,
) -> anyhow::Result<()> {
    let (mut config, path) = voxgate::config::load_config(config_path)?;
    config.server.port = port.unwrap_or_else(|| voxgate::config::resolve_port(&config));
    log::info!(
        "starting adapter on {}:{} (config {})",
        config.server.bind,
        config.server.port,
        path.display()
    );

    let adapter = Arc::new(Adapter::new(config));
    adapter.connect().await?;

    let consumer = {
        let adapter = adapter.clone();
        tokio::spawn(async move {
            let mut events = adapter.listen().await;
            while let Some(event) = events.next().await {
                log::info!(
                    "event {}: {} ({})",
                    event.correlation_key,
                    event.request_type,
                    event.intent_name.as_deref().unwrap_or("-")
                );
                if echo {
                    let reply = echo_reply(&event);
                    if let Err(e) = adapter.send_command(&reply).await {
                        log::warn!("echo reply failed: {}", e);
                    }
                }
            }
        })
    };

    voxgate::gateway::wait_for_shutdown_signal().await;
    adapter.disconnect().await;
    let _ = consumer.await;
    Ok(())
}

fn echo_reply(event: &InboundEvent) -> OutboundCommand {
    let intent = event.intent_name.as_deref().unwrap_or(&event.request_type);
    let slots = if event.slots.is_empty() {
        String::new()
    } else {
        format!(" with slots {}", serde_json::Value::Object(event.slots.clone()))
    };
    OutboundCommand::note(
        event.correlation_key.clone(),
        format!("You asked for {}{}.", intent, slots),
    )
    .with_title(intent.to_string())
}
