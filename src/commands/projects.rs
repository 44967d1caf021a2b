use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::info;

use crate::state::projects::Project;
use crate::{Context, Error};

/// Which project field `/project update` changes
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ProjectField {
    #[name = "description"]
    Description,
    #[name = "status"]
    Status,
}

/// Commands for project management
#[poise::command(
    slash_command,
    guild_only,
    subcommands("create", "adduser", "archive", "update")
)]
pub async fn project(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Commands for task management
#[poise::command(slash_command, guild_only, subcommands("add", "complete"))]
pub async fn task(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Creates a new project with a dedicated channel and role
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS | MANAGE_ROLES"
)]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Project name"] name: String,
    #[description = "What the project is about"] description: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a guild")?;

    // Reject duplicates before touching any guild state
    if ctx.data().projects.read().await.get(&name).is_ok() {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("❌ A project named '{}' already exists.", name))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    ctx.defer_ephemeral().await?;

    let role = guild_id
        .create_role(
            ctx.http(),
            serenity::EditRole::new().name(format!("Project: {}", name)),
        )
        .await?;

    let channels = guild_id.channels(ctx.http()).await?;
    let category_id = match channels
        .values()
        .find(|c| c.kind == serenity::ChannelType::Category && c.name == "Projects")
    {
        Some(category) => category.id,
        None => {
            guild_id
                .create_channel(
                    ctx.http(),
                    serenity::CreateChannel::new("Projects")
                        .kind(serenity::ChannelType::Category),
                )
                .await?
                .id
        }
    };

    let overwrites = vec![
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::empty(),
            deny: serenity::Permissions::VIEW_CHANNEL,
            kind: serenity::PermissionOverwriteType::Role(guild_id.everyone_role()),
        },
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::VIEW_CHANNEL,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Role(role.id),
        },
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::VIEW_CHANNEL,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(ctx.framework().bot_id),
        },
    ];

    let channel = guild_id
        .create_channel(
            ctx.http(),
            serenity::CreateChannel::new(&name)
                .kind(serenity::ChannelType::Text)
                .category(category_id)
                .permissions(overwrites),
        )
        .await?;

    if let Some(member) = ctx.author_member().await {
        member.add_role(ctx.http(), role.id).await?;
    }

    let entry = Project::new(description, channel.id, role.id);
    if let Err(e) = ctx.data().projects.write().await.create(&name, entry.clone()) {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("❌ {}", e))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    render_hub(&ctx, &name, &entry).await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "✅ Project '{}' created! Channel: {}",
                name,
                channel.id.mention()
            ))
            .ephemeral(true),
    )
    .await?;
    info!("Project '{}' created by {}", name, ctx.author().name);
    Ok(())
}

/// Adds a user to a project
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_ROLES")]
pub async fn adduser(
    ctx: Context<'_>,
    #[description = "Project name"] project_name: String,
    #[description = "Member to add"] user: serenity::Member,
) -> Result<(), Error> {
    let entry = { ctx.data().projects.read().await.get(&project_name) };
    match entry {
        Ok(entry) => {
            user.add_role(ctx.http(), entry.role_id).await?;
            ctx.send(
                poise::CreateReply::default()
                    .content(format!(
                        "✅ Added {} to '{}'.",
                        user.user.mention(),
                        project_name
                    ))
                    .ephemeral(true),
            )
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

/// Archives a project, locking its channel
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS | MANAGE_ROLES"
)]
pub async fn archive(
    ctx: Context<'_>,
    #[description = "Project name"] project_name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command can only be used in a guild")?;

    let archived = { ctx.data().projects.write().await.archive(&project_name) };
    let entry = match archived {
        Ok(entry) => entry,
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

    ctx.defer_ephemeral().await?;

    // Rename the channel and stop the project role from posting
    if let Some(channel) = entry.channel_id.to_channel(ctx.http()).await?.guild() {
        entry
            .channel_id
            .edit(
                ctx.http(),
                serenity::EditChannel::new().name(format!("archived-{}", channel.name)),
            )
            .await?;
    }
    entry
        .channel_id
        .create_permission(
            ctx.http(),
            serenity::PermissionOverwrite {
                allow: serenity::Permissions::VIEW_CHANNEL,
                deny: serenity::Permissions::SEND_MESSAGES,
                kind: serenity::PermissionOverwriteType::Role(entry.role_id),
            },
        )
        .await?;

    let roles = guild_id.roles(ctx.http()).await?;
    if let Some(role) = roles.get(&entry.role_id) {
        guild_id
            .edit_role(
                ctx.http(),
                entry.role_id,
                serenity::EditRole::new().name(format!("archived-{}", role.name)),
            )
            .await?;
    }

    render_hub(&ctx, &project_name, &entry).await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!("✅ Project '{}' has been archived.", project_name))
            .ephemeral(true),
    )
    .await?;
    info!("Project '{}' archived by {}", project_name, ctx.author().name);
    Ok(())
}

/// Updates a project's details
#[poise::command(slash_command, guild_only)]
pub async fn update(
    ctx: Context<'_>,
    #[description = "Project name"] project_name: String,
    #[description = "Field to change"] field: ProjectField,
    #[description = "New value"] new_value: String,
) -> Result<(), Error> {
    let updated = {
        let mut store = ctx.data().projects.write().await;
        match field {
            ProjectField::Description => store.set_description(&project_name, new_value),
            ProjectField::Status => store.set_status(&project_name, new_value),
        }
    };

    if let Err(e) = updated {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("❌ {}", e))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let entry = ctx.data().projects.read().await.get(&project_name)?;
    render_hub(&ctx, &project_name, &entry).await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!("✅ Project '{}' has been updated.", project_name))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Adds a task to a project
#[poise::command(slash_command, guild_only)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Project name"] project_name: String,
    #[description = "What needs doing"] task_description: String,
) -> Result<(), Error> {
    let added = {
        ctx.data()
            .projects
            .write()
            .await
            .add_task(&project_name, task_description)
    };

    let task_id = match added {
        Ok(task_id) => task_id,
        // Unknown project: nothing in the channel is touched
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

    let entry = ctx.data().projects.read().await.get(&project_name)?;
    render_hub(&ctx, &project_name, &entry).await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!("✅ Task {} added to '{}'.", task_id, project_name))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Marks a task as complete
#[poise::command(slash_command, guild_only)]
pub async fn complete(
    ctx: Context<'_>,
    #[description = "Project name"] project_name: String,
    #[description = "Task ID"]
    #[min = 1]
    task_id: u32,
) -> Result<(), Error> {
    let completed = {
        ctx.data()
            .projects
            .write()
            .await
            .complete_task(&project_name, task_id)
    };

    if let Err(e) = completed {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("❌ {}", e))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let entry = ctx.data().projects.read().await.get(&project_name)?;
    render_hub(&ctx, &project_name, &entry).await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "✅ Task {} in '{}' marked as complete.",
                task_id, project_name
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Re-render the canonical status embed in the project channel: edit the
/// bot's most recent hub post in place, or send a fresh one if none is found
/// in the last ten messages.
async fn render_hub(ctx: &Context<'_>, name: &str, entry: &Project) -> Result<(), Error> {
    let title = format!("Project Hub: {}", name);

    let task_list = if entry.tasks.is_empty() {
        "No tasks yet.".to_string()
    } else {
        entry
            .tasks
            .iter()
            .map(|t| {
                format!(
                    "- `[{}]` ID: {} - {}",
                    if t.completed { "x" } else { " " },
                    t.id,
                    t.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = serenity::CreateEmbed::new()
        .title(title.clone())
        .field("Status", entry.status.clone(), true)
        .field(
            "Description",
            entry.description.clone().unwrap_or_else(|| "N/A".to_string()),
            false,
        )
        .field("Tasks", task_list, false)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Project ID: {}",
            entry.channel_id
        )))
        .color(0x1f8b4c)
        .timestamp(serenity::Timestamp::now());

    let bot_id = ctx.framework().bot_id;
    let recent = entry
        .channel_id
        .messages(ctx.http(), serenity::GetMessages::new().limit(10))
        .await?;
    for message in recent {
        let is_hub = message.author.id == bot_id
            && message
                .embeds
                .first()
                .and_then(|e| e.title.as_deref())
                == Some(title.as_str());
        if is_hub {
            entry
                .channel_id
                .edit_message(
                    ctx.http(),
                    message.id,
                    serenity::EditMessage::new().embed(embed),
                )
                .await?;
            return Ok(());
        }
    }

    entry
        .channel_id
        .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
        .await?;
    Ok(())
}
