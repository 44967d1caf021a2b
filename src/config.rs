use poise::serenity_prelude::{GuildId, UserId};

use crate::error::{BotError, Result};

/// Runtime configuration, read once at startup. There is no config file and
/// no on-disk state; everything resets on process restart.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Discord bot token
    pub token: String,
    /// The single guild commands are registered to
    pub guild_id: GuildId,
    /// User allowed to run owner-only commands
    pub owner_id: UserId,
    /// Port for the liveness endpoint
    pub port: u16,
}

impl BotConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("BOT_TOKEN").map_err(|_| BotError::MissingEnv { name: "BOT_TOKEN" })?;
        let guild_id = require_u64("GUILD_ID", std::env::var("GUILD_ID").ok())?;
        let owner_id = require_u64("OWNER_ID", std::env::var("OWNER_ID").ok())?;

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        Ok(Self {
            token,
            guild_id: GuildId::new(guild_id),
            owner_id: UserId::new(owner_id),
            port,
        })
    }
}

fn require_u64(name: &'static str, value: Option<String>) -> Result<u64> {
    let value = value.ok_or(BotError::MissingEnv { name })?;
    match value.parse() {
        Ok(parsed) if parsed != 0 => Ok(parsed),
        _ => Err(BotError::InvalidEnv { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_u64_parses_snowflake() {
        assert_eq!(
            require_u64("GUILD_ID", Some("123456789012345678".to_string())).unwrap(),
            123456789012345678
        );
    }

    #[test]
    fn test_require_u64_rejects_missing_and_garbage() {
        assert!(matches!(
            require_u64("GUILD_ID", None),
            Err(BotError::MissingEnv { name: "GUILD_ID" })
        ));
        assert!(matches!(
            require_u64("OWNER_ID", Some("not-a-number".to_string())),
            Err(BotError::InvalidEnv { .. })
        ));
        // Snowflakes are never zero
        assert!(matches!(
            require_u64("OWNER_ID", Some("0".to_string())),
            Err(BotError::InvalidEnv { .. })
        ));
    }
}
