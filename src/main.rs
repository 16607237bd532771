// This is the entry point of the support relay bot.
//
// **Architecture Overview:**
// - `core/` = Relay rules and restart policy (platform-agnostic)
// - `infra/` = Implementations of core traits (Bot API client, in-memory stores)
// - `telegram/` = Update loop, supervisor and the keepalive endpoint
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Start the keepalive endpoint and the supervised update loop

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "telegram/telegram_layer.rs"]
mod telegram;

mod config;

use crate::config::BotConfig;
use crate::core::relay::{ChatGateway, RelayService};
use crate::infra::relay::{InMemoryBlockList, InMemoryQuestionStore};
use crate::infra::telegram::TelegramClient;
use crate::telegram::liveness;
use crate::telegram::supervisor::BotSupervisor;
use crate::telegram::update_poller::UpdatePoller;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!("Bot stopped: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: BotConfig) -> anyhow::Result<()> {
    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let client = TelegramClient::new(config.bot_token.clone(), config.poll_timeout_secs)?;

    let questions = InMemoryQuestionStore::new(config.question_capacity, config.question_ttl);
    let mut relay = RelayService::new(
        client.clone(),
        InMemoryBlockList::new(),
        questions,
        config.moderation_chat_id,
    );

    // Own username, so commands addressed to other bots are left alone.
    match ChatGateway::get_me(&client).await {
        Ok(me) => {
            tracing::info!(bot_id = %me.id, username = ?me.username, "Connected to Bot API");
            if let Some(username) = me.username {
                relay = relay.with_bot_username(username);
            }
        }
        Err(e) => tracing::warn!("Could not fetch bot identity: {}", e),
    }
    let relay = Arc::new(relay);

    tracing::info!(
        moderation_chat = %relay.moderation_chat(),
        "🤖 Bot is starting up..."
    );

    // ========================================================================
    // KEEPALIVE ENDPOINT
    // ========================================================================

    let listener = liveness::bind(liveness::pick_port(config.keepalive_port)).await?;
    tokio::spawn(async move {
        if let Err(e) = liveness::serve(listener).await {
            tracing::error!("Keepalive server stopped: {}", e);
        }
    });

    // ========================================================================
    // SUPERVISED UPDATE LOOP
    // ========================================================================

    let poller = Arc::new(UpdatePoller::new(client, config.poll_timeout_secs));
    let supervisor = BotSupervisor::new(
        poller,
        relay,
        config.health_check_interval,
        config.restart_policy.clone(),
    );

    tokio::select! {
        result = supervisor.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping");
            Ok(())
        }
    }
}
