use std::collections::HashSet;

use anyhow::Result;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};

mod commands;
mod config;
mod error;
mod events;
mod scheduler;
mod state;
mod web;

use commands::{
    ban, coinflip, event, giveaway, hello, help, kick, poll, project, purge, rolldice, serverinfo,
    softban, sync, task, techfact, unban, userinfo,
};
use config::BotConfig;
use events::{handle_component, handle_member_add};
use state::{
    create_shared_event_store, create_shared_giveaway_store, create_shared_project_store,
    SharedEventStore, SharedGiveawayStore, SharedProjectStore,
};

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared application state. Owns the in-memory registries: constructed at
/// startup, discarded at shutdown, nothing survives a restart.
pub struct Data {
    pub config: BotConfig,
    pub giveaways: SharedGiveawayStore,
    pub events: SharedEventStore,
    pub projects: SharedProjectStore,
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(e) = handle_member_add(ctx, new_member, data).await {
                error!("Failed to handle new member: {}", e);
            }
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => {
            if let Err(e) = handle_component(ctx, component, data).await {
                error!("Failed to handle component interaction: {}", e);
            }
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let config = BotConfig::from_env()?;
    info!(
        "Configured for guild {} (owner {})",
        config.guild_id, config.owner_id
    );

    let giveaways = create_shared_giveaway_store();
    let event_store = create_shared_event_store();
    let projects = create_shared_project_store();

    let guild_id = config.guild_id;
    let owner_id = config.owner_id;
    let port = config.port;
    let token = config.token.clone();

    // Build framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                hello(),
                help(),
                serverinfo(),
                userinfo(),
                sync(),
                kick(),
                ban(),
                unban(),
                softban(),
                purge(),
                poll(),
                coinflip(),
                rolldice(),
                techfact(),
                giveaway(),
                event(),
                project(),
                task(),
            ],
            owners: HashSet::from([owner_id]),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' invoked by {} (ID: {}) in {}",
                        ctx.command().qualified_name,
                        ctx.author().name,
                        ctx.author().id,
                        ctx.guild_id()
                            .map(|g| g.to_string())
                            .unwrap_or_else(|| "DM".to_string())
                    );
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' completed for {}",
                        ctx.command().qualified_name,
                        ctx.author().name
                    );
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!(
                                "Error in command '{}': {}",
                                ctx.command().qualified_name,
                                error
                            );
                            let _ = ctx
                                .send(
                                    poise::CreateReply::default()
                                        .content(format!("❌ An unexpected error occurred: {}", error))
                                        .ephemeral(true),
                                )
                                .await;
                        }
                        poise::FrameworkError::ArgumentParse { error, input, ctx, .. } => {
                            error!(
                                "Argument parse error in '{}': {} (input: {:?})",
                                ctx.command().qualified_name,
                                error,
                                input
                            );
                        }
                        poise::FrameworkError::MissingBotPermissions { missing_permissions, ctx, .. } => {
                            error!(
                                "Bot missing permissions for '{}': {:?}",
                                ctx.command().qualified_name,
                                missing_permissions
                            );
                            let _ = ctx
                                .send(
                                    poise::CreateReply::default()
                                        .content(format!("❌ Bot is missing permissions: {:?}", missing_permissions))
                                        .ephemeral(true),
                                )
                                .await;
                        }
                        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
                            error!(
                                "User {} missing permissions for '{}'",
                                ctx.author().name,
                                ctx.command().qualified_name
                            );
                            let _ = ctx
                                .send(
                                    poise::CreateReply::default()
                                        .content("❌ You do not have the required permissions to use this command.")
                                        .ephemeral(true),
                                )
                                .await;
                        }
                        poise::FrameworkError::NotAnOwner { ctx, .. } => {
                            error!(
                                "User {} tried to use owner command '{}'",
                                ctx.author().name,
                                ctx.command().qualified_name
                            );
                            let _ = ctx
                                .send(
                                    poise::CreateReply::default()
                                        .content("❌ You are not the owner!")
                                        .ephemeral(true),
                                )
                                .await;
                        }
                        poise::FrameworkError::GuildOnly { ctx, .. } => {
                            error!(
                                "Command '{}' is guild-only, used in DM by {}",
                                ctx.command().qualified_name,
                                ctx.author().name
                            );
                        }
                        other => {
                            error!("Other framework error: {}", other);
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            let config = config.clone();
            let giveaways = giveaways.clone();
            let event_store = event_store.clone();
            let projects = projects.clone();

            Box::pin(async move {
                info!("Bot logged in as: {}", ready.user.name);

                // Register to the configured guild for instant propagation
                info!("Registering commands to guild: {}", guild_id);
                if let Err(e) = poise::builtins::register_in_guild(
                    ctx,
                    &framework.options().commands,
                    guild_id,
                )
                .await
                {
                    error!("Failed to register commands for guild {}: {}", guild_id, e);
                } else {
                    info!(
                        "Successfully registered {} commands for guild {}",
                        framework.options().commands.len(),
                        guild_id
                    );
                }

                // Liveness endpoint for the hosting platform
                tokio::spawn(async move {
                    if let Err(e) = web::serve(port).await {
                        error!("Liveness endpoint error: {}", e);
                    }
                });

                // Background sweeps; both run for the process lifetime
                tokio::spawn(scheduler::events::run(ctx.http.clone(), event_store.clone()));
                tokio::spawn(scheduler::giveaways::run(ctx.http.clone(), giveaways.clone()));

                Ok(Data {
                    config,
                    giveaways,
                    events: event_store,
                    projects,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::GUILD_MEMBERS;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot...");
    if let Err(e) = client.start().await {
        let err_str = e.to_string();
        if err_str.contains("Disallowed") || err_str.contains("intents") {
            error!("Failed to start bot: {}", e);
            error!("The GUILD_MEMBERS privileged intent must be enabled in the Discord Developer Portal:");
            error!("https://discord.com/developers/applications -> Your App -> Bot -> Privileged Gateway Intents");
            return Err(anyhow::anyhow!(
                "Disallowed gateway intents. Enable GUILD_MEMBERS in the Discord Developer Portal"
            ));
        }
        return Err(e.into());
    }
    warn!("Bot ended.");

    Ok(())
}
