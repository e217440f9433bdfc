// This is the entry point of the ranks bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (files, databases)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::config::BotConfig;
use crate::core::ranks::{
    ActivityTracker, PointsLedger, RankQueryService, RanksService, SettingsService,
};
use crate::discord::message_events::{inbound_from, request_member_chunks};
use crate::discord::{Data, Error};
use crate::infra::ranks::{JsonSettingsStore, LastSpokeFile, LedgerBackend};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
/// This is where messages are turned into XP.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    // The leaderboard reads the member cache, so fill it for large guilds.
    if let serenity::FullEvent::GuildCreate { guild, .. } = event {
        request_member_chunks(ctx, guild);
    }

    if let serenity::FullEvent::Message { new_message } = event {
        let message = inbound_from(new_message);

        match data.ranks.process_message(&message).await {
            Ok(Some(award)) => {
                tracing::debug!(
                    guild_id = award.guild_id,
                    user_id = award.user_id,
                    delta = award.delta,
                    total_xp = award.total_xp,
                    "XP awarded"
                );
            }
            Ok(None) => {
                // Bot, DM, or still on cooldown - nothing to do
            }
            Err(e) => {
                // Log it but don't crash; the next message will try again
                tracing::error!(
                    guild_id = message.guild_id,
                    user_id = message.user_id,
                    "Error awarding XP for message: {}",
                    e
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    let config = BotConfig::from_env()?;
    std::fs::create_dir_all(&config.data_dir)?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let settings_service =
        Arc::new(SettingsService::new(JsonSettingsStore::new(config.settings_path())).await?);

    // The ledger backend is chosen once; new credentials apply on restart.
    let credentials = settings_service.credentials().await;
    let sqlite_path = config.sqlite_path().to_string_lossy().to_string();
    let backend =
        LedgerBackend::connect(credentials.as_ref(), &sqlite_path, &config.mysql_database).await?;
    tracing::info!(backend = backend.name(), "XP ledger ready");
    let ledger = Arc::new(PointsLedger::new(backend));

    let last_spoke_file = Arc::new(LastSpokeFile::new(config.last_spoke_path()));
    let tracker = Arc::new(ActivityTracker::new());
    tracker.restore(last_spoke_file.load());

    let ranks_service = Arc::new(RanksService::new(
        Arc::clone(&settings_service),
        Arc::clone(&tracker),
        Arc::clone(&ledger),
    ));
    let rank_query = Arc::new(RankQueryService::new(Arc::clone(&ledger)));

    let data = Data {
        settings: Arc::clone(&settings_service),
        ranks: Arc::clone(&ranks_service),
        rank_query: Arc::clone(&rank_query),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read dbsetup answers
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS; // Leaderboard skips members who left

    let snapshot_interval = config.snapshot_interval;
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::ranks::rank(),
                discord::commands::ranks::levels(),
                discord::commands::ranks_settings::ranks(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered, bot is ready");

                // Background cooldown snapshot so a restart keeps recent cooldowns.
                let tracker = Arc::clone(&tracker);
                let file = Arc::clone(&last_spoke_file);
                tokio::spawn(async move {
                    use tokio::time::sleep;

                    loop {
                        sleep(snapshot_interval).await;
                        let records = tracker.snapshot();
                        let count = records.len();
                        match file.save(records) {
                            Ok(()) => tracing::debug!(records = count, "Cooldown snapshot saved"),
                            Err(err) => tracing::warn!("Cooldown snapshot failed: {}", err),
                        }
                    }
                });

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    client.start().await?;
    Ok(())
}
