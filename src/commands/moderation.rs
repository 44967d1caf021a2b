use std::collections::HashMap;

use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::{debug, info};

use crate::error::{is_not_found, BotError};
use crate::{Context, Error};

const DEFAULT_REASON: &str = "No reason provided.";

/// Kicks a member from the server
#[poise::command(slash_command, guild_only, required_permissions = "KICK_MEMBERS")]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "Member to kick"] member: serenity::Member,
    #[description = "Reason"] reason: Option<String>,
) -> Result<(), Error> {
    let reason = reason.unwrap_or_else(|| DEFAULT_REASON.to_string());

    if let Err(e) = ensure_actor_outranks(&ctx, &member).await {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("❌ {}", e))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let guild_name = guild_name(&ctx).await;
    notify_target(
        &ctx,
        &member.user,
        &format!("You have been kicked from **{}** for: {}", guild_name, reason),
    )
    .await;

    member
        .guild_id
        .kick_with_reason(ctx.http(), member.user.id, &reason)
        .await?;

    let embed = mod_log_embed("Kick", &member.user, ctx.author(), &reason, 0xe67e22);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    info!("{} kicked {}: {}", ctx.author().name, member.user.name, reason);
    Ok(())
}

/// Bans a member from the server
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "Member to ban"] member: serenity::Member,
    #[description = "Reason"] reason: Option<String>,
) -> Result<(), Error> {
    let reason = reason.unwrap_or_else(|| DEFAULT_REASON.to_string());

    if let Err(e) = ensure_actor_outranks(&ctx, &member).await {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("❌ {}", e))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let guild_name = guild_name(&ctx).await;
    notify_target(
        &ctx,
        &member.user,
        &format!("You have been banned from **{}** for: {}", guild_name, reason),
    )
    .await;

    member
        .guild_id
        .ban_with_reason(ctx.http(), member.user.id, 0, &reason)
        .await?;

    let embed = mod_log_embed("Ban", &member.user, ctx.author(), &reason, 0xe74c3c);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    info!("{} banned {}: {}", ctx.author().name, member.user.name, reason);
    Ok(())
}

/// Unbans a user from the server
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn unban(
    ctx: Context<'_>,
    #[description = "User ID to unban"] user_id: String,
    #[description = "Reason"] reason: Option<String>,
) -> Result<(), Error> {
    let reason = reason.unwrap_or_else(|| DEFAULT_REASON.to_string());
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a guild")?;

    let user = match user_id.trim().parse::<u64>() {
        Ok(id) if id != 0 => ctx.http().get_user(serenity::UserId::new(id)).await.ok(),
        _ => None,
    };
    let Some(user) = user else {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ Invalid user ID or user not found.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    match guild_id.unban(ctx.http(), user.id).await {
        Ok(()) => {
            let embed = mod_log_embed("Unban", &user, ctx.author(), &reason, 0x2ecc71);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
            info!("{} unbanned {}: {}", ctx.author().name, user.name, reason);
        }
        Err(e) if is_not_found(&e) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("❌ User {} is not banned.", user.name))
                    .ephemeral(true),
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Bans and immediately unbans a member to delete their recent messages
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn softban(
    ctx: Context<'_>,
    #[description = "Member to softban"] member: serenity::Member,
    #[description = "Reason"] reason: Option<String>,
) -> Result<(), Error> {
    let reason = reason.unwrap_or_else(|| "Message cleanup.".to_string());

    if let Err(e) = ensure_actor_outranks(&ctx, &member).await {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("❌ {}", e))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    member
        .guild_id
        .ban_with_reason(ctx.http(), member.user.id, 7, &format!("Softban: {}", reason))
        .await?;
    member.guild_id.unban(ctx.http(), member.user.id).await?;

    let embed = mod_log_embed("Softban", &member.user, ctx.author(), &reason, 0x992d22);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    info!("{} softbanned {}: {}", ctx.author().name, member.user.name, reason);
    Ok(())
}

/// Deletes a number of recent messages from this channel
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn purge(
    ctx: Context<'_>,
    #[description = "Number of messages to delete"]
    #[min = 1]
    #[max = 100]
    amount: u8,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;

    let messages = ctx
        .channel_id()
        .messages(ctx.http(), serenity::GetMessages::new().limit(amount))
        .await?;
    let ids: Vec<serenity::MessageId> = messages.iter().map(|m| m.id).collect();
    let deleted = ids.len();

    // Bulk deletion needs at least two messages
    match deleted {
        0 => {}
        1 => ctx.channel_id().delete_message(ctx.http(), ids[0]).await?,
        _ => ctx.channel_id().delete_messages(ctx.http(), ids).await?,
    }

    ctx.send(
        poise::CreateReply::default()
            .content(format!("✅ Deleted {} messages.", deleted))
            .ephemeral(true),
    )
    .await?;
    info!("{} purged {} messages", ctx.author().name, deleted);
    Ok(())
}

/// The actor's top role must sit strictly above the target's, regardless of
/// the static permission checks already done by the framework.
async fn ensure_actor_outranks(
    ctx: &Context<'_>,
    target: &serenity::Member,
) -> crate::error::Result<()> {
    let roles = target.guild_id.roles(ctx.http()).await?;
    let positions: HashMap<serenity::RoleId, u16> =
        roles.iter().map(|(id, role)| (*id, role.position)).collect();

    let actor = ctx
        .author_member()
        .await
        .ok_or_else(|| BotError::Discord {
            message: "Could not resolve the invoking member".to_string(),
        })?;

    let actor_top = top_role_position(&positions, &actor.roles);
    let target_top = top_role_position(&positions, &target.roles);
    if actor_top <= target_top {
        return Err(BotError::RoleHierarchy {
            target: target.user.name.clone(),
        });
    }
    Ok(())
}

/// Highest role position a member holds; 0 when they only have @everyone
fn top_role_position(
    positions: &HashMap<serenity::RoleId, u16>,
    member_roles: &[serenity::RoleId],
) -> u16 {
    member_roles
        .iter()
        .filter_map(|id| positions.get(id))
        .copied()
        .max()
        .unwrap_or(0)
}

/// DM the target about the action taken against them. Closed DMs are not an
/// error.
async fn notify_target(ctx: &Context<'_>, user: &serenity::User, content: &str) {
    if let Ok(dm) = user.create_dm_channel(ctx.http()).await {
        if let Err(e) = dm
            .send_message(ctx.http(), serenity::CreateMessage::new().content(content))
            .await
        {
            debug!("Could not DM {}: {}", user.name, e);
        }
    }
}

async fn guild_name(ctx: &Context<'_>) -> String {
    match ctx.partial_guild().await {
        Some(guild) => guild.name,
        None => "this server".to_string(),
    }
}

fn mod_log_embed(
    action: &str,
    user: &serenity::User,
    moderator: &serenity::User,
    reason: &str,
    color: u32,
) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(format!("{}: {}", action, user.name))
        .color(color)
        .timestamp(serenity::Timestamp::now())
        .field("User", user.mention().to_string(), true)
        .field("Moderator", moderator.mention().to_string(), true)
        .field("Reason", reason.to_string(), false)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "User ID: {}",
            user.id
        )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_role_position() {
        let positions: HashMap<serenity::RoleId, u16> = [
            (serenity::RoleId::new(1), 3),
            (serenity::RoleId::new(2), 7),
            (serenity::RoleId::new(3), 5),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            top_role_position(
                &positions,
                &[serenity::RoleId::new(1), serenity::RoleId::new(3)]
            ),
            5
        );
        assert_eq!(top_role_position(&positions, &[serenity::RoleId::new(2)]), 7);
        // Only @everyone (no tracked roles)
        assert_eq!(top_role_position(&positions, &[]), 0);
        // Roles the guild no longer knows about are ignored
        assert_eq!(top_role_position(&positions, &[serenity::RoleId::new(9)]), 0);
    }
}
