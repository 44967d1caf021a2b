use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::info;

use crate::{Context, Error};

/// One help page per command group
struct HelpPage {
    group: &'static str,
    commands: &'static [(&'static str, &'static str)],
}

const HELP_PAGES: &[HelpPage] = &[
    HelpPage {
        group: "General",
        commands: &[
            ("/hello", "The bot says hello back to you"),
            ("/help", "Displays a list of all available commands"),
            ("/serverinfo", "Shows information about the server"),
            ("/userinfo", "Shows information about a user"),
            ("/sync", "Re-registers slash commands (owner only)"),
        ],
    },
    HelpPage {
        group: "Moderation",
        commands: &[
            ("/kick", "Kicks a member from the server"),
            ("/ban", "Bans a member from the server"),
            ("/unban", "Unbans a user from the server"),
            ("/softban", "Bans and unbans a member to delete their messages"),
            ("/purge", "Deletes a number of recent messages"),
        ],
    },
    HelpPage {
        group: "Engagement",
        commands: &[
            ("/poll", "Creates a poll with up to 10 options"),
            ("/coinflip", "Flips a coin"),
            ("/rolldice", "Rolls dice in NdM format (e.g. 2d6)"),
            ("/techfact", "Fetches a random tech fact"),
        ],
    },
    HelpPage {
        group: "Giveaways",
        commands: &[
            ("/giveaway start", "Starts a giveaway in this channel"),
            ("/giveaway reroll", "Rerolls a completed giveaway"),
            ("/giveaway list", "Lists all active giveaways"),
        ],
    },
    HelpPage {
        group: "Events",
        commands: &[
            ("/event create", "Creates a new event"),
            ("/event cancel", "Cancels an event"),
            ("/event list", "Lists all upcoming events"),
            ("/event details", "Shows the RSVP details for an event"),
        ],
    },
    HelpPage {
        group: "Projects",
        commands: &[
            ("/project create", "Creates a new project with a channel and role"),
            ("/project adduser", "Adds a user to a project"),
            ("/project archive", "Archives a project"),
            ("/project update", "Updates a project's details"),
            ("/task add", "Adds a task to a project"),
            ("/task complete", "Marks a task as complete"),
        ],
    },
];

/// How long the paginator keeps responding to clicks
const HELP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(180);

/// The bot says hello back to you
#[poise::command(slash_command)]
pub async fn hello(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(format!(
        "Hello, {}! I'm up and listening for commands.",
        ctx.author().mention()
    ))
    .await?;
    Ok(())
}

/// Displays a list of all available commands
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let mut page = 0;

    let reply = ctx
        .send(
            poise::CreateReply::default()
                .embed(help_embed(page))
                .components(vec![nav_row(page, false)])
                .ephemeral(true),
        )
        .await?;
    let message = reply.message().await?;

    while let Some(interaction) = message
        .await_component_interaction(ctx.serenity_context().shard.clone())
        .timeout(HELP_TIMEOUT)
        .await
    {
        match interaction.data.custom_id.as_str() {
            "help_prev" if page > 0 => page -= 1,
            "help_next" if page + 1 < HELP_PAGES.len() => page += 1,
            _ => {
                // Click on a disabled edge; nothing to change
                interaction
                    .create_response(ctx.http(), serenity::CreateInteractionResponse::Acknowledge)
                    .await?;
                continue;
            }
        }

        interaction
            .create_response(
                ctx.http(),
                serenity::CreateInteractionResponse::UpdateMessage(
                    serenity::CreateInteractionResponseMessage::new()
                        .embed(help_embed(page))
                        .components(vec![nav_row(page, false)]),
                ),
            )
            .await?;
    }

    // Timed out: leave the current page visible with navigation disabled
    reply
        .edit(
            ctx,
            poise::CreateReply::default()
                .embed(help_embed(page))
                .components(vec![nav_row(page, true)]),
        )
        .await
        .ok();
    Ok(())
}

fn help_embed(page: usize) -> serenity::CreateEmbed {
    let help_page = &HELP_PAGES[page];
    let mut embed = serenity::CreateEmbed::new()
        .title(format!("NexGen Bot Help: {}", help_page.group))
        .description(format!("Commands for the {} module:", help_page.group))
        .color(0x3498db)
        .timestamp(serenity::Timestamp::now())
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Page {}/{}",
            page + 1,
            HELP_PAGES.len()
        )));
    for (name, description) in help_page.commands {
        embed = embed.field(format!("**{}**", name), *description, false);
    }
    embed
}

fn nav_row(page: usize, expired: bool) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new("help_prev")
            .label("Previous")
            .style(serenity::ButtonStyle::Primary)
            .disabled(expired || page == 0),
        serenity::CreateButton::new("help_next")
            .label("Next")
            .style(serenity::ButtonStyle::Primary)
            .disabled(expired || page + 1 == HELP_PAGES.len()),
    ])
}

/// Shows information about the server
#[poise::command(slash_command, guild_only)]
pub async fn serverinfo(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a guild")?;
    let guild = guild_id.to_partial_guild_with_counts(ctx.http()).await?;
    let channels = guild_id.channels(ctx.http()).await?;

    let text_channels = channels
        .values()
        .filter(|c| c.kind == serenity::ChannelType::Text)
        .count();
    let voice_channels = channels
        .values()
        .filter(|c| c.kind == serenity::ChannelType::Voice)
        .count();
    let member_count = guild
        .approximate_member_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("Server Info: {}", guild.name))
        .color(0x2ecc71)
        .timestamp(serenity::Timestamp::now())
        .field("Owner", guild.owner_id.mention().to_string(), true)
        .field("Members", member_count, true)
        .field(
            "Created At",
            format!("<t:{}:D>", guild_id.created_at().unix_timestamp()),
            true,
        )
        .field("Roles", guild.roles.len().to_string(), true)
        .field("Text Channels", text_channels.to_string(), true)
        .field("Voice Channels", voice_channels.to_string(), true)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Server ID: {}",
            guild_id
        )));
    if let Some(icon) = guild.icon_url() {
        embed = embed.thumbnail(icon);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Shows information about a user
#[poise::command(slash_command, guild_only)]
pub async fn userinfo(
    ctx: Context<'_>,
    #[description = "Member to look up (defaults to you)"] member: Option<serenity::Member>,
) -> Result<(), Error> {
    let member = match member {
        Some(member) => member,
        None => ctx
            .author_member()
            .await
            .ok_or("Could not resolve your guild membership")?
            .into_owned(),
    };
    let user = &member.user;

    let joined = member
        .joined_at
        .map(|t| format!("<t:{}:D>", t.unix_timestamp()))
        .unwrap_or_else(|| "unknown".to_string());
    let roles = if member.roles.is_empty() {
        "No roles".to_string()
    } else {
        member
            .roles
            .iter()
            .map(|id| id.mention().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("User Info: {}", member.display_name()))
        .color(0x3498db)
        .timestamp(serenity::Timestamp::now())
        .thumbnail(user.face())
        .field("Full Name", user.tag(), true)
        .field("Joined Server", joined, true)
        .field(
            "Account Created",
            format!("<t:{}:D>", user.id.created_at().unix_timestamp()),
            true,
        )
        .field(format!("Roles ({})", member.roles.len()), roles, false)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "User ID: {}",
            user.id
        )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Re-registers slash commands to the configured guild (owner only)
#[poise::command(slash_command, owners_only)]
pub async fn sync(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.data().config.guild_id;
    let commands = &ctx.framework().options().commands;

    poise::builtins::register_in_guild(ctx.serenity_context(), commands, guild_id).await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "✅ Synced {} command(s) to the server.",
                commands.len()
            ))
            .ephemeral(true),
    )
    .await?;
    info!("{} re-synced slash commands", ctx.author().name);
    Ok(())
}
