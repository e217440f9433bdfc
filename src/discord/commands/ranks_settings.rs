use crate::core::ranks::credential_setup::SetupStep;
use crate::core::ranks::{CredentialSetup, RanksError};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use std::time::Instant;

/// Chat-activity rank management.
#[poise::command(slash_command, prefix_command, guild_only, subcommands("settings"))]
pub async fn ranks(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Use `/rank` to see your rank, `/levels` for the leaderboard, or `/ranks settings` to configure.")
        .await?;
    Ok(())
}

/// Ranking system settings. Only server admins should see this.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    subcommands("show", "defaults", "cooldown", "maxpoints", "dbsetup", "reload")
)]
pub async fn settings(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show current settings.
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();

    let Some(settings) = ctx.data().settings.configured(guild_id).await else {
        ctx.say(
            ":warning: **Ranks - Current Settings**: The server is not configured! \
             Please run `/ranks settings default` first and try again.",
        )
        .await?;
        return Ok(());
    };

    ctx.say(format!(
        ":information_source: **Ranks - Current Settings**:\n```\
         Cooldown time:  {} seconds.\n\
         Maximum points: {} points per eligible message```",
        settings.cooldown_secs, settings.max_points
    ))
    .await?;
    Ok(())
}

/// Set default for max points and cooldown.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    rename = "default"
)]
pub async fn defaults(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();

    if let Err(e) = ctx.data().settings.reset_to_defaults(guild_id).await {
        return report_failure(ctx, "Default", e).await;
    }

    tracing::info!(
        guild_id,
        user_id = ctx.author().id.get(),
        user = %ctx.author().name,
        "Ranks settings reset to defaults"
    );
    ctx.say(
        ":information_source: **Ranks - Default:** Defaults set, run \
         `/ranks settings show` to verify the settings.",
    )
    .await?;
    Ok(())
}

/// Set the cooldown required between XP gains (in seconds).
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn cooldown(
    ctx: Context<'_>,
    #[description = "Seconds between XP gains"] seconds: i64,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();

    match ctx.data().settings.set_cooldown(guild_id, seconds).await {
        Ok(updated) => {
            tracing::info!(
                guild_id,
                user_id = ctx.author().id.get(),
                user = %ctx.author().name,
                seconds = updated.cooldown_secs,
                "Cooldown changed"
            );
            ctx.say(format!(
                ":white_check_mark: **Ranks - Cooldown**: Set to {} seconds.",
                updated.cooldown_secs
            ))
            .await?;
        }
        Err(RanksError::InvalidArgument(_)) => {
            ctx.say(
                ":negative_squared_cross_mark: **Ranks - Cooldown**: \
                 Please enter a valid time in seconds!",
            )
            .await?;
        }
        Err(e) => return report_failure(ctx, "Cooldown", e).await,
    }
    Ok(())
}

/// Set max points per eligible message. Defaults to 25 points.
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn maxpoints(
    ctx: Context<'_>,
    #[description = "Maximum points per eligible message (default 25)"] points: Option<i64>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();
    let points = points.unwrap_or(crate::core::ranks::ranks_models::DEFAULT_MAX_POINTS as i64);

    match ctx.data().settings.set_max_points(guild_id, points).await {
        Ok(updated) => {
            tracing::info!(
                guild_id,
                user_id = ctx.author().id.get(),
                user = %ctx.author().name,
                max_points = updated.max_points,
                "Maximum points per message changed"
            );
            ctx.say(format!(
                ":white_check_mark: **Ranks - Max Points**: Users can gain up to {} points \
                 per eligible message.",
                updated.max_points
            ))
            .await?;
        }
        Err(RanksError::InvalidArgument(_)) => {
            ctx.say(
                ":negative_squared_cross_mark: **Ranks - Max Points**: \
                 Please enter a positive number.",
            )
            .await?;
        }
        Err(e) => return report_failure(ctx, "Max Points", e).await,
    }
    Ok(())
}

/// Set up the database connection. DO NOT USE if ranks is working.
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn dbsetup(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Database set up:").await?;

    let mut setup = CredentialSetup::start(Instant::now());
    while let Some(prompt) = setup.prompt() {
        ctx.say(prompt).await?;

        let reply = serenity::MessageCollector::new(ctx)
            .author_id(ctx.author().id)
            .channel_id(ctx.channel_id())
            .timeout(setup.remaining(Instant::now()))
            .await;

        let Some(reply) = reply else {
            let reason = setup.abort();
            tracing::info!(user_id = ctx.author().id.get(), "Database setup aborted: {}", reason);
            ctx.say("No response received, not setting anything!").await?;
            return Ok(());
        };

        // Don't leave the password sitting in the channel.
        if matches!(setup.step(), SetupStep::AwaitingPassword { .. }) {
            if let Err(e) = reply.delete(ctx.http()).await {
                tracing::warn!("Could not delete password message: {}", e);
            }
        }

        setup = match setup.supply(&reply.content, Instant::now()) {
            Ok(next) => next,
            Err(e) => {
                tracing::info!(user_id = ctx.author().id.get(), "Database setup aborted: {}", e);
                ctx.say("No response received, not setting anything!").await?;
                return Ok(());
            }
        };
    }

    let credentials = setup
        .into_credentials()
        .ok_or("Database setup ended without credentials")?;

    if let Err(e) = ctx.data().settings.set_credentials(credentials).await {
        return report_failure(ctx, "Database", e).await;
    }

    tracing::info!(
        user_id = ctx.author().id.get(),
        user = %ctx.author().name,
        "Database connection changed"
    );
    ctx.say("Settings saved. Restart the bot to connect the XP ledger with the new credentials.")
        .await?;
    Ok(())
}

/// Re-read the settings file from disk.
#[poise::command(slash_command, prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn reload(ctx: Context<'_>) -> Result<(), Error> {
    if let Err(e) = ctx.data().settings.reload().await {
        return report_failure(ctx, "Reload", e).await;
    }

    tracing::info!(user_id = ctx.author().id.get(), "Ranks settings reloaded from disk");
    ctx.say(":white_check_mark: **Ranks - Reload**: Settings reloaded from disk.")
        .await?;
    Ok(())
}

async fn report_failure(ctx: Context<'_>, area: &str, error: RanksError) -> Result<(), Error> {
    tracing::error!("Ranks settings ({}) failed: {}", area, error);
    ctx.say(format!(
        ":negative_squared_cross_mark: **Ranks - {}**: Something went wrong, \
         nothing was changed.",
        area
    ))
    .await?;
    Ok(())
}
