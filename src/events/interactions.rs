use poise::serenity_prelude as serenity;
use tracing::info;

use crate::commands::events::{RSVP_GOING_ID, RSVP_INTERESTED_ID};
use crate::error::BotError;
use crate::state::events::{Rsvp, RsvpOutcome};
use crate::{Data, Error};

/// Dispatch clicks on the RSVP buttons attached to event announcements. The
/// buttons are matched by custom ID, not by any in-memory view, so they keep
/// working for announcements posted before the last restart as long as the
/// event entry is registered.
pub async fn handle_component(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let choice = match interaction.data.custom_id.as_str() {
        RSVP_GOING_ID => Rsvp::Going,
        RSVP_INTERESTED_ID => Rsvp::Interested,
        _ => return Ok(()),
    };

    let outcome = {
        data.events
            .write()
            .await
            .rsvp(interaction.message.id, interaction.user.id, choice)
    };

    let notice = match outcome {
        Ok(RsvpOutcome::NowGoing) => {
            info!(
                "{} is going to event {}",
                interaction.user.name, interaction.message.id
            );
            "You are now marked as **going**!"
        }
        Ok(RsvpOutcome::NowInterested) => {
            info!(
                "{} is interested in event {}",
                interaction.user.name, interaction.message.id
            );
            "You are now marked as **interested**."
        }
        Ok(RsvpOutcome::AlreadyGoing) => "You are already marked as going.",
        Ok(RsvpOutcome::AlreadyInterestedOrGoing) => {
            "You are already marked as interested or going."
        }
        Err(BotError::EventExpired) => "This event seems to have expired or been canceled.",
        Err(e) => return Err(e.into()),
    };

    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(notice)
                    .ephemeral(true),
            ),
        )
        .await?;

    Ok(())
}
