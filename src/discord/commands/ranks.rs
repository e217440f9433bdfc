// Discord commands for reading ranks.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Format the response based on the result
//
// This layer is THIN - no business logic, just translation.

use crate::core::ranks::{
    LeaderboardRow, RankQueryService, RankRow, RanksService, SettingsService,
    DEFAULT_LEADERBOARD_SIZE,
};
use crate::infra::ranks::{JsonSettingsStore, LedgerBackend};
use poise::serenity_prelude as serenity;
use std::collections::HashMap;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
pub struct Data {
    pub settings: Arc<SettingsService<JsonSettingsStore>>,
    pub ranks: Arc<RanksService<LedgerBackend, JsonSettingsStore>>,
    pub rank_query: Arc<RankQueryService<LedgerBackend>>,
}

/// Check your rank in the server.
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn rank(
    ctx: Context<'_>,
    #[description = "User to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target_user = user.as_ref().unwrap_or_else(|| ctx.author());
    let user_id = target_user.id.get();
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    if target_user.bot {
        ctx.say("Bots don't earn XP! 🤖").await?;
        return Ok(());
    }

    let row = match ctx.data().rank_query.format_rank(guild_id, user_id).await {
        Ok(row) => row,
        Err(e) if e.is_not_found() => {
            ctx.say(format!(
                "{} is not ranked yet. Start chatting to earn some XP! 💬",
                target_user.name
            ))
            .await?;
            return Ok(());
        }
        Err(e) => {
            tracing::error!(guild_id, user_id, "Failed to look up rank: {}", e);
            ctx.say("Something went wrong when checking your level. Please notify the admin!")
                .await?;
            return Ok(());
        }
    };

    let display_name = resolve_display_name_cached(&ctx, guild_id, user_id);
    let embed = serenity::CreateEmbed::new()
        .author(serenity::CreateEmbedAuthor::new(display_name).icon_url(target_user.face()))
        .colour(serenity::Colour::RED)
        .field("Rank", row.rank.to_string(), true)
        .field("Level", row.level.to_string(), true)
        .field("Exp.", format_exp(&row), true)
        .footer(serenity::CreateEmbedFooter::new(
            "Note: This EXP is different from Mee6.",
        ));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show the server ranking leaderboard.
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn levels(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    // Snapshot the roster first: cache refs can't be held across an await.
    let roster = current_roster(&ctx);

    let rows = match ctx
        .data()
        .rank_query
        .format_leaderboard(guild_id, DEFAULT_LEADERBOARD_SIZE, &roster)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(guild_id, "Failed to build leaderboard: {}", e);
            ctx.say("Something went wrong when loading the leaderboard. Please notify the admin!")
                .await?;
            return Ok(());
        }
    };

    if rows.is_empty() {
        ctx.say("No one has earned XP yet! Start chatting to get on the leaderboard! 💬")
            .await?;
        return Ok(());
    }

    ctx.say(render_leaderboard(&rows)).await?;
    Ok(())
}

/// Display names of everyone the cache knows to be in the guild.
fn current_roster(ctx: &Context<'_>) -> HashMap<u64, String> {
    ctx.guild()
        .map(|guild| {
            guild
                .members
                .iter()
                .map(|(id, member)| (id.get(), member.display_name().to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Guild nickname or username from cache, falling back to a mention.
///
/// Cache only: no HTTP calls, so the command answers instantly.
fn resolve_display_name_cached(ctx: &Context<'_>, guild_id: u64, user_id: u64) -> String {
    let guild_id_s = serenity::GuildId::from(guild_id);
    let user_id_s = serenity::UserId::from(user_id);

    if let Some(guild) = ctx.serenity_context().cache.guild(guild_id_s) {
        if let Some(member) = guild.members.get(&user_id_s) {
            return member.display_name().to_string();
        }
    }

    if let Some(user) = ctx.serenity_context().cache.user(user_id_s) {
        return user.name.clone();
    }

    format!("<@{}>", user_id)
}

fn format_exp(row: &RankRow) -> String {
    format!(
        "{}/{} (total {})",
        row.xp_in_level, row.xp_for_level, row.total_xp
    )
}

fn render_leaderboard(rows: &[LeaderboardRow]) -> String {
    let mut msg = String::from(":information_source: **Ranks - Leaderboard**\n```");
    for row in rows {
        msg.push_str(&format!(
            "{:<3}{:<23}{:>10}\n",
            row.position,
            format!("{} ", row.display_name),
            row.xp
        ));
    }
    msg.push_str("```");
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exp_field_shows_progress_and_total() {
        let row = RankRow {
            rank: 3,
            user_id: 1,
            level: 2,
            xp_in_level: 45,
            xp_for_level: 220,
            total_xp: 300,
        };
        assert_eq!(format_exp(&row), "45/220 (total 300)");
    }

    #[test]
    fn leaderboard_is_a_padded_code_block() {
        let rows = vec![
            LeaderboardRow {
                position: 1,
                user_id: 10,
                display_name: "alice".into(),
                xp: 1200,
            },
            LeaderboardRow {
                position: 2,
                user_id: 11,
                display_name: "bob".into(),
                xp: 90,
            },
        ];

        let msg = render_leaderboard(&rows);
        let lines: Vec<&str> = msg.lines().collect();
        assert_eq!(lines[0], ":information_source: **Ranks - Leaderboard**");
        assert_eq!(lines[1], "```1  alice                        1200");
        assert_eq!(lines[2], "2  bob                            90");
        assert_eq!(lines[3], "```");
    }
}
