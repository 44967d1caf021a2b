use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::{error, info};

use crate::state::events::DueReminder;
use crate::state::SharedEventStore;

/// How often the event registry is inspected for expiries and due reminders
const SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Periodic sweep over the event registry: drops events whose start time has
/// passed and sends reminder pings for newly due milestones. Runs for the
/// process lifetime.
pub async fn run(http: Arc<serenity::Http>, store: SharedEventStore) {
    info!("Event reminder sweep started ({}s period)", SWEEP_PERIOD.as_secs());
    let mut interval = tokio::time::interval(SWEEP_PERIOD);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        // Milestones are recorded inside the sweep, before any send, so a
        // delivery failure never causes a repeat ping.
        let outcome = { store.write().await.sweep(Utc::now()) };

        for (message_id, entry) in outcome.expired {
            info!("Event '{}' ({}) has started, entry removed", entry.title, message_id);
        }

        for reminder in outcome.reminders {
            if let Err(e) = send_reminder(&http, &reminder).await {
                error!(
                    "Failed to send {} reminder for event '{}': {}",
                    reminder.milestone.notice(),
                    reminder.title,
                    e
                );
            }
        }
    }
}

async fn send_reminder(http: &serenity::Http, reminder: &DueReminder) -> Result<(), serenity::Error> {
    if reminder.recipients.is_empty() {
        return Ok(());
    }

    let mentions = reminder
        .recipients
        .iter()
        .map(|id| id.mention().to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let embed = serenity::CreateEmbed::new()
        .title(format!("Reminder: {}", reminder.title))
        .description(format!(
            "This event is starting in {}!",
            reminder.milestone.notice()
        ))
        .color(0xf1c40f);

    reminder
        .channel_id
        .send_message(
            http,
            serenity::CreateMessage::new().content(mentions).embed(embed),
        )
        .await?;

    info!(
        "Sent {} reminder for event '{}' to {} participants",
        reminder.milestone.notice(),
        reminder.title,
        reminder.recipients.len()
    );
    Ok(())
}
