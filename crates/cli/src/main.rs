mod config_commands;

use std::sync::Arc;

use {
    anyhow::Context as _,
    clap::{Parser, Subcommand},
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    shion_agents::providers::GeminiClient, shion_chat::ChatService,
    shion_discord::HttpAttachmentReader, shion_sessions::HistoryStore,
};

#[derive(Parser)]
#[command(name = "shion", about = "Shion: Discord chat bot backed by Gemini")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and start answering (default when no subcommand is provided).
    Run,
    /// Print the resolved configuration with secrets redacted.
    Config,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

async fn run() -> anyhow::Result<()> {
    let config = match shion_config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return Err(e.into());
        },
    };

    info!(
        model = %config.gemini.model,
        history_max_len = config.discord.history_max_len.get(),
        proxy = config.proxy.is_some(),
        "configuration loaded"
    );

    let proxy = config.proxy.as_deref();
    let gemini =
        GeminiClient::from_config(&config.gemini, proxy).context("failed to build gemini client")?;
    let reader =
        HttpAttachmentReader::with_proxy(proxy).context("failed to build attachment reader")?;

    let service = ChatService::new(
        Arc::new(gemini),
        Arc::new(reader),
        HistoryStore::new(config.discord.history_max_len),
        Some(config.gemini.prompt.clone()),
    )
    .with_error_details(config.discord.error_details);

    shion_discord::start(&config.discord, Arc::new(service)).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "shion starting");
            run().await
        },
        Some(Commands::Config) => config_commands::show(),
    }
}
