use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::{error, info};

use crate::error::is_not_found;
use crate::state::giveaways::draw_winners;
use crate::state::SharedGiveawayStore;

/// How often end times are compared against the clock. Giveaways resolve
/// within one period of expiring rather than at the exact instant.
const SWEEP_PERIOD: Duration = Duration::from_secs(5);

/// Periodic sweep resolving giveaways whose end time has passed. Each
/// giveaway is a registry entry keyed by end time, not a suspended task, so
/// nothing is lost to a long in-flight sleep and the loop mirrors the event
/// sweep.
pub async fn run(http: Arc<serenity::Http>, store: SharedGiveawayStore) {
    info!("Giveaway sweep started ({}s period)", SWEEP_PERIOD.as_secs());
    let mut interval = tokio::time::interval(SWEEP_PERIOD);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let due = { store.read().await.due(Utc::now()) };
        for message_id in due {
            if let Err(e) = resolve(&http, &store, message_id).await {
                error!("Failed to resolve giveaway {}: {}", message_id, e);
            }
        }
    }
}

/// Resolve one expired giveaway: snapshot entrants, announce the outcome.
async fn resolve(
    http: &serenity::Http,
    store: &SharedGiveawayStore,
    message_id: serenity::MessageId,
) -> Result<(), serenity::Error> {
    let Some(giveaway) = ({ store.read().await.get_active(message_id).cloned() }) else {
        return Ok(());
    };

    let message = match giveaway.channel_id.message(http, message_id).await {
        Ok(message) => message,
        Err(e) if is_not_found(&e) => {
            // Announcement deleted: drop the entry, no winners, no snapshot
            store.write().await.discard(message_id);
            info!("Giveaway {} announcement deleted, entry discarded", message_id);
            return Ok(());
        }
        // Transient failure: leave the entry for the next pass
        Err(e) => return Err(e),
    };

    let participants = collect_entrants(http, &message).await?;
    store
        .write()
        .await
        .complete(message_id, participants.clone());

    if participants.is_empty() {
        let embed = serenity::CreateEmbed::new()
            .title(format!("Giveaway Ended: {}", giveaway.prize))
            .description("No one entered the giveaway.")
            .color(0x607d8b)
            .timestamp(serenity::Timestamp::now());
        giveaway
            .channel_id
            .edit_message(http, message_id, serenity::EditMessage::new().embed(embed))
            .await?;
        info!("Giveaway '{}' ended with no entrants", giveaway.prize);
        return Ok(());
    }

    let winners = {
        let mut rng = rand::thread_rng();
        draw_winners(&participants, giveaway.winners, &mut rng)
    };
    let winner_mentions = winners
        .iter()
        .map(|id| id.mention().to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let embed = serenity::CreateEmbed::new()
        .title(format!("🎉 Giveaway Ended: {} 🎉", giveaway.prize))
        .description(format!(
            "Congratulations to {}! You won the **{}**.",
            winner_mentions, giveaway.prize
        ))
        .color(0x2ecc71)
        .timestamp(serenity::Timestamp::now());

    giveaway
        .channel_id
        .send_message(
            http,
            serenity::CreateMessage::new()
                .embed(embed)
                .reference_message(&message),
        )
        .await?;

    info!(
        "Giveaway '{}' ended: {} winners from {} entrants",
        giveaway.prize,
        winners.len(),
        participants.len()
    );
    Ok(())
}

/// All non-bot users who reacted with 🎉, fetched in pages of 100
async fn collect_entrants(
    http: &serenity::Http,
    message: &serenity::Message,
) -> Result<Vec<serenity::UserId>, serenity::Error> {
    let reaction = serenity::ReactionType::Unicode("🎉".to_string());
    let mut entrants = Vec::new();
    let mut after: Option<serenity::UserId> = None;

    loop {
        let batch = message
            .reaction_users(http, reaction.clone(), Some(100), after)
            .await?;
        let batch_len = batch.len();
        after = batch.last().map(|u| u.id);
        entrants.extend(batch.into_iter().filter(|u| !u.bot).map(|u| u.id));
        if batch_len < 100 {
            break;
        }
    }

    Ok(entrants)
}
