use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::{debug, info};

use crate::{Data, Error};

/// Handle when a new member joins the configured guild
pub async fn handle_member_add(
    ctx: &serenity::Context,
    new_member: &serenity::Member,
    data: &Data,
) -> Result<(), Error> {
    if new_member.guild_id != data.config.guild_id {
        return Ok(());
    }

    info!(
        "New member joined: {} in guild {}",
        new_member.user.name, new_member.guild_id
    );

    let Some(channel) = find_welcome_channel(ctx, new_member.guild_id).await else {
        debug!("No welcome channel in guild {}, skipping greeting", new_member.guild_id);
        return Ok(());
    };

    let guild_name = new_member
        .guild_id
        .to_partial_guild(&ctx.http)
        .await
        .map(|g| g.name)
        .unwrap_or_else(|_| "the server".to_string());

    let embed = serenity::CreateEmbed::new()
        .title(format!("Welcome to {}!", guild_name))
        .description(format!(
            "Hello {}, we're glad to have you here! Please check out the server rules and select your roles.",
            new_member.mention()
        ))
        .color(0x9b59b6)
        .timestamp(serenity::Timestamp::now())
        .thumbnail(new_member.user.face())
        .footer(serenity::CreateEmbedFooter::new(
            "We hope you enjoy your stay!",
        ));

    channel
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
        .await?;

    Ok(())
}

/// Find the welcome channel in a guild, if one exists
pub async fn find_welcome_channel(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
) -> Option<serenity::GuildChannel> {
    let channels = guild_id.channels(&ctx.http).await.ok()?;

    channels
        .into_values()
        .find(|channel| {
            channel.kind == serenity::ChannelType::Text
                && channel.name.to_lowercase() == "welcome"
        })
}
