use std::sync::Arc;

use {
    anyhow::Context as _,
    secrecy::ExposeSecret,
    serenity::Client,
    shion_chat::ChatService,
    shion_config::DiscordConfig,
    tracing::{info, warn},
};

use crate::handler::DiscordHandler;

/// Connect to the gateway and process events until the connection ends or
/// the process receives Ctrl-C.
///
/// Serenity's REST client picks up `https_proxy`/`HTTPS_PROXY` from the
/// environment on its own.
pub async fn start(config: &DiscordConfig, service: Arc<ChatService>) -> anyhow::Result<()> {
    let mut client = Client::builder(config.token.expose_secret(), DiscordHandler::intents())
        .event_handler(DiscordHandler::new(service))
        .await
        .context("failed to build discord client")?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("shutting down discord connection");
        shard_manager.shutdown_all().await;
    });

    info!("connecting to discord gateway");
    client.start().await.context("discord gateway error")?;
    Ok(())
}
