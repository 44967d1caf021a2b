use chrono::Utc;
use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::info;

use crate::commands::parse_message_id;
use crate::state::giveaways::{parse_duration, ActiveGiveaway};
use crate::{Context, Error};

/// Commands for managing giveaways
#[poise::command(slash_command, guild_only, subcommands("start", "reroll", "list"))]
pub async fn giveaway(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Starts a giveaway in this channel
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn start(
    ctx: Context<'_>,
    #[description = "How long the giveaway runs, e.g. 30m or 2d"] duration: String,
    #[description = "Number of winners"]
    #[min = 1]
    winners: u32,
    #[description = "What is being given away"] prize: String,
) -> Result<(), Error> {
    let span = match parse_duration(&duration) {
        Ok(span) => span,
        Err(e) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("❌ {}", e))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    };
    let end_time = Utc::now() + span;

    ctx.send(
        poise::CreateReply::default()
            .content("Giveaway started!")
            .ephemeral(true),
    )
    .await?;

    let embed = serenity::CreateEmbed::new()
        .title(format!("🎉 Giveaway: {} 🎉", prize))
        .description(format!(
            "React with 🎉 to enter!\nEnds <t:{}:F>\nWinners: {}",
            end_time.timestamp(),
            winners
        ))
        .color(0xe91e63)
        .timestamp(serenity::Timestamp::now())
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Started by {}",
            ctx.author().display_name()
        )));

    let message = ctx
        .channel_id()
        .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
        .await?;
    message
        .react(
            ctx.serenity_context(),
            serenity::ReactionType::Unicode("🎉".to_string()),
        )
        .await?;

    ctx.data().giveaways.write().await.start(
        message.id,
        ActiveGiveaway {
            prize: prize.clone(),
            end_time,
            winners: winners as usize,
            channel_id: ctx.channel_id(),
        },
    );

    info!(
        "Giveaway '{}' started by {} (ends {})",
        prize,
        ctx.author().name,
        end_time
    );
    Ok(())
}

/// Rerolls a completed giveaway
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn reroll(
    ctx: Context<'_>,
    #[description = "Message ID of the completed giveaway"] message_id: String,
) -> Result<(), Error> {
    let message_id = match parse_message_id(&message_id) {
        Ok(id) => id,
        Err(e) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("❌ {}", e))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    };

    let drawn = {
        let store = ctx.data().giveaways.read().await;
        let mut rng = rand::thread_rng();
        store.reroll(message_id, &mut rng)
    };

    match drawn {
        Ok(winner) => {
            let embed = serenity::CreateEmbed::new()
                .title("🎉 Giveaway Reroll 🎉")
                .description(format!(
                    "The new winner is {}! Congratulations!",
                    winner.mention()
                ))
                .color(0xf1c40f)
                .timestamp(serenity::Timestamp::now());
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
            info!("Giveaway {} rerolled by {}", message_id, ctx.author().name);
        }
        Err(e) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("❌ {}", e))
                    .ephemeral(true),
            )
            .await?;
        }
    }

    Ok(())
}

/// Lists all active giveaways
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let entries = ctx.data().giveaways.read().await.list_active();

    if entries.is_empty() {
        let embed = serenity::CreateEmbed::new()
            .title("No Active Giveaways")
            .description("There are currently no active giveaways.")
            .color(0x95a5a6)
            .timestamp(serenity::Timestamp::now());
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        return Ok(());
    }

    let guild_id = ctx.guild_id().map(|g| g.get()).unwrap_or_default();
    let mut embed = serenity::CreateEmbed::new()
        .title("Active Giveaways")
        .color(0x3498db)
        .timestamp(serenity::Timestamp::now());
    for (message_id, giveaway) in entries {
        embed = embed.field(
            format!("Prize: {}", giveaway.prize),
            format!(
                "Ends: <t:{}:F>\nWinners: {}\n[Jump to Giveaway](https://discord.com/channels/{}/{}/{})",
                giveaway.end_time.timestamp(),
                giveaway.winners,
                guild_id,
                giveaway.channel_id,
                message_id
            ),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
