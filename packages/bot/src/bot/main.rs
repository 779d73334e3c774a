// Main entry point for the sticker moderation bot

use std::sync::Arc;

use anyhow::{Context, Result};
use bot_core::moderation::ModerationPipeline;
use bot_core::platform::{DiscordPlatform, Platform};
use bot_core::Config;
use discord::gateway::{self, Event, Gateway};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bot_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sticker moderation bot");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration validated");

    let client = Arc::new(discord::Client::new(config.bot_token.clone()));
    let platform: Arc<dyn Platform> = Arc::new(DiscordPlatform::new(client));

    let intents = gateway::INTENT_GUILDS
        | gateway::INTENT_GUILD_MEMBERS
        | gateway::INTENT_GUILD_MODERATION
        | gateway::INTENT_GUILD_EXPRESSIONS
        | gateway::INTENT_GUILD_MESSAGES
        | gateway::INTENT_MESSAGE_CONTENT;

    let (events_tx, mut events_rx) = mpsc::channel(256);
    tokio::spawn(Gateway::new(config.bot_token.clone(), intents).run(events_tx));

    // The pipeline is built on the first READY, which carries our own user
    // id, and survives reconnects so the caches stay warm.
    let mut pipeline: Option<Arc<ModerationPipeline>> = None;

    while let Some(event) = events_rx.recv().await {
        match event {
            Event::Ready(ready) => {
                tracing::info!(
                    tag = %ready.user.tag(),
                    guilds = ready.guilds.len(),
                    "logged in"
                );
                tracing::info!(log_channel_id = %config.log_channel_id, "audit channel configured");
                if pipeline.is_none() {
                    pipeline = Some(Arc::new(ModerationPipeline::new(
                        platform.clone(),
                        &config,
                        ready.user.id.clone(),
                    )));
                }
            }
            Event::MessageCreate(message) => {
                let Some(pipeline) = pipeline.clone() else {
                    continue;
                };
                tokio::spawn(async move {
                    pipeline.handle_message(&message).await;
                });
            }
        }
    }

    Ok(())
}
