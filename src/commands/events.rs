use chrono::Utc;
use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::{info, warn};

use crate::commands::parse_message_id;
use crate::error::{is_not_found, BotError};
use crate::state::events::{parse_start_time, EventEntry};
use crate::{Context, Data, Error};

/// Custom IDs for the RSVP buttons. Stable across restarts so the buttons on
/// old announcements keep working as long as the entry is registered.
pub const RSVP_GOING_ID: &str = "event_rsvp_going";
pub const RSVP_INTERESTED_ID: &str = "event_rsvp_interested";

#[derive(Debug, poise::Modal)]
#[name = "Create a New Event"]
struct EventModal {
    #[name = "Event Title"]
    title: String,
    #[name = "Description"]
    #[paragraph]
    description: String,
    #[name = "Date and time (YYYY-MM-DD HH:MM, UTC)"]
    #[placeholder = "2025-12-25 18:00"]
    when: String,
    #[name = "Location"]
    location: String,
}

/// Commands for event management
#[poise::command(
    slash_command,
    guild_only,
    subcommands("create", "cancel", "list", "details")
)]
pub async fn event(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Creates a new event
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_EVENTS")]
pub async fn create(ctx: poise::ApplicationContext<'_, Data, Error>) -> Result<(), Error> {
    use poise::Modal;

    let Some(modal) = EventModal::execute(ctx).await? else {
        // Modal dismissed or timed out
        return Ok(());
    };
    let ctx = Context::Application(ctx);

    let start_time = match parse_start_time(&modal.when) {
        Ok(time) => time,
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
    if start_time < Utc::now() {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("❌ {}", BotError::EventInPast))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let guild_id = ctx.guild_id().ok_or("This command can only be used in a guild")?;

    ctx.send(
        poise::CreateReply::default()
            .content("Event created!")
            .ephemeral(true),
    )
    .await?;

    let embed = serenity::CreateEmbed::new()
        .title(format!("🎉 New Event: {}", modal.title))
        .description(format!(
            "**Description:**\n{}\n\n**When:** <t:{}:F>\n**Where:** {}",
            modal.description,
            start_time.timestamp(),
            modal.location
        ))
        .color(0x9b59b6)
        .timestamp(serenity::Timestamp::now())
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Event created by {}",
            ctx.author().display_name()
        )));

    let buttons = vec![
        serenity::CreateButton::new(RSVP_GOING_ID)
            .label("✅ Going")
            .style(serenity::ButtonStyle::Success),
        serenity::CreateButton::new(RSVP_INTERESTED_ID)
            .label("🤔 Interested")
            .style(serenity::ButtonStyle::Primary),
    ];

    let message = ctx
        .channel_id()
        .send_message(
            ctx.http(),
            serenity::CreateMessage::new()
                .embed(embed)
                .components(vec![serenity::CreateActionRow::Buttons(buttons)]),
        )
        .await?;

    ctx.data().events.write().await.create(
        message.id,
        EventEntry::new(modal.title.clone(), start_time, guild_id, ctx.channel_id()),
    );

    info!(
        "Event '{}' created by {} (starts {})",
        modal.title,
        ctx.author().name,
        start_time
    );
    Ok(())
}

/// Cancels an event
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_EVENTS")]
pub async fn cancel(
    ctx: Context<'_>,
    #[description = "Message ID of the event announcement"] event_message_id: String,
) -> Result<(), Error> {
    let message_id = match parse_message_id(&event_message_id) {
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

    let removed = { ctx.data().events.write().await.cancel(message_id) };
    match removed {
        Ok(entry) => {
            // Best effort: the announcement may already be gone
            if let Err(e) = entry.channel_id.delete_message(ctx.http(), message_id).await {
                if !is_not_found(&e) {
                    warn!("Could not delete announcement for event '{}': {}", entry.title, e);
                }
            }
            ctx.send(
                poise::CreateReply::default()
                    .content("✅ Event has been canceled.")
                    .ephemeral(true),
            )
            .await?;
            info!("Event '{}' canceled by {}", entry.title, ctx.author().name);
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

/// Lists all upcoming events
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let entries = ctx.data().events.read().await.list();

    if entries.is_empty() {
        let embed = serenity::CreateEmbed::new()
            .title("No Upcoming Events")
            .description(
                "There are currently no scheduled events.\n*Note: Events are cleared when the bot restarts.*",
            )
            .color(0x95a5a6)
            .timestamp(serenity::Timestamp::now());
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        return Ok(());
    }

    let guild_id = ctx.guild_id().map(|g| g.get()).unwrap_or_default();
    let mut embed = serenity::CreateEmbed::new()
        .title("Upcoming Events")
        .color(0x2c3e50)
        .timestamp(serenity::Timestamp::now());
    for (message_id, entry) in entries {
        embed = embed.field(
            entry.title.clone(),
            format!(
                "**Event ID:** `{}`\n<t:{}:F> - [Jump to Event](https://discord.com/channels/{}/{}/{})",
                message_id,
                entry.start_time.timestamp(),
                guild_id,
                entry.channel_id,
                message_id
            ),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Shows the RSVP details for an event
#[poise::command(slash_command, guild_only)]
pub async fn details(
    ctx: Context<'_>,
    #[description = "Message ID of the event announcement"] event_message_id: String,
) -> Result<(), Error> {
    let message_id = match parse_message_id(&event_message_id) {
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

    let entry = { ctx.data().events.read().await.details(message_id) };
    match entry {
        Ok(entry) => {
            let going = mention_list(&entry.going);
            let interested = mention_list(&entry.interested);
            let embed = serenity::CreateEmbed::new()
                .title(format!("RSVP Details for: {}", entry.title))
                .color(0x3498db)
                .timestamp(serenity::Timestamp::now())
                .field(format!("✅ Going ({})", entry.going.len()), going, false)
                .field(
                    format!("🤔 Interested ({})", entry.interested.len()),
                    interested,
                    false,
                );
            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await?;
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

fn mention_list(users: &[serenity::UserId]) -> String {
    if users.is_empty() {
        return "No one yet.".to_string();
    }
    users
        .iter()
        .map(|id| id.mention().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
