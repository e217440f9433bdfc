// Discord-specific event plumbing for the ranking system.
//
// Turns gateway events into the plain values the core understands.

use crate::core::ranks::InboundMessage;
use poise::serenity_prelude as serenity;

/// Seconds since the Unix epoch, keeping the sub-second part.
///
/// The cooldown check is a strict `>` on these values, so two messages in
/// the same wall-clock second must still differ.
pub fn timestamp_secs(timestamp: &serenity::Timestamp) -> f64 {
    (timestamp.timestamp() as i128 * 1_000_000_000 + timestamp.timestamp_subsec_nanos() as i128) as f64 / 1e9
}

/// Extract what the award pipeline needs from a Discord message.
pub fn inbound_from(message: &serenity::Message) -> InboundMessage {
    InboundMessage {
        guild_id: message.guild_id.map(|id| id.get()).unwrap_or_default(),
        user_id: message.author.id.get(),
        is_bot: message.author.bot,
        is_private_channel: message.guild_id.is_none(),
        timestamp: timestamp_secs(&message.timestamp),
    }
}

/// Large guilds only send online members in GUILD_CREATE.
fn roster_incomplete(cached_members: usize, member_count: u64) -> bool {
    (cached_members as u64) < member_count
}

/// Ask the gateway for the full member list when the cache only has part
/// of it, so the leaderboard doesn't skip offline members.
pub fn request_member_chunks(ctx: &serenity::Context, guild: &serenity::Guild) {
    if !roster_incomplete(guild.members.len(), guild.member_count) {
        return;
    }

    tracing::debug!(
        guild_id = guild.id.get(),
        cached = guild.members.len(),
        member_count = guild.member_count,
        "Requesting member chunks"
    );
    ctx.shard
        .chunk_guild(guild.id, None, false, serenity::ChunkGuildFilter::None, None);
}
