use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    // Configuration errors
    #[error("Missing environment variable {name}")]
    MissingEnv { name: &'static str },

    #[error("Environment variable {name} is not valid: {value}")]
    InvalidEnv { name: &'static str, value: String },

    // Validation errors
    #[error("Invalid duration '{input}'. Use <number><unit> with unit s, m, h, or d (e.g. `30m`)")]
    InvalidDuration { input: String },

    #[error("Invalid dice spec '{input}'. Use NdM format (e.g. `2d6`)")]
    InvalidDiceSpec { input: String },

    #[error("Dice out of range: use 1-25 dice with 1-100 sides")]
    DiceOutOfRange { dice: u32, sides: u32 },

    #[error("Invalid date format '{input}'. Use YYYY-MM-DD HH:MM (UTC)")]
    BadTimeFormat { input: String },

    #[error("The event start time is in the past")]
    EventInPast,

    #[error("Invalid message ID '{input}'")]
    InvalidMessageId { input: String },

    // Not-found errors
    #[error("This event seems to have expired or been canceled")]
    EventExpired,

    #[error("No event found with message ID {message_id}")]
    EventNotFound { message_id: u64 },

    #[error("Message ID {message_id} is not a completed giveaway")]
    GiveawayNotCompleted { message_id: u64 },

    #[error("There were no participants in this giveaway")]
    NoParticipants { message_id: u64 },

    #[error("Project '{name}' not found")]
    ProjectNotFound { name: String },

    #[error("A project named '{name}' already exists")]
    ProjectExists { name: String },

    #[error("Task {task_id} not found in project '{project}'")]
    TaskNotFound { project: String, task_id: u32 },

    // Authorization errors
    #[error("You cannot moderate {target}: their top role is equal to or above yours")]
    RoleHierarchy { target: String },

    // Discord errors
    #[error("Discord API error: {message}")]
    Discord { message: String },
}

/// True when a Discord API failure means the target no longer exists, as
/// opposed to a transient transport problem.
pub fn is_not_found(err: &serenity::Error) -> bool {
    match err {
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(resp)) => {
            resp.status_code.as_u16() == 404
        }
        _ => false,
    }
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        BotError::Discord {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

use poise::serenity_prelude as serenity;
