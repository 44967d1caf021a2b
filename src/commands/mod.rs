pub mod engagement;
pub mod events;
pub mod general;
pub mod giveaways;
pub mod moderation;
pub mod projects;

pub use engagement::{coinflip, poll, rolldice, techfact};
pub use events::event;
pub use general::{hello, help, serverinfo, sync, userinfo};
pub use giveaways::giveaway;
pub use moderation::{ban, kick, purge, softban, unban};
pub use projects::{project, task};

use poise::serenity_prelude::MessageId;

use crate::error::{BotError, Result};

/// Parse a message ID supplied as a command argument
pub(crate) fn parse_message_id(input: &str) -> Result<MessageId> {
    let invalid = || BotError::InvalidMessageId {
        input: input.to_string(),
    };
    let value: u64 = input.trim().parse().map_err(|_| invalid())?;
    if value == 0 {
        return Err(invalid());
    }
    Ok(MessageId::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_id() {
        assert_eq!(
            parse_message_id("1234567890").unwrap(),
            MessageId::new(1234567890)
        );
        assert!(matches!(
            parse_message_id("not-an-id"),
            Err(BotError::InvalidMessageId { .. })
        ));
    }
}
