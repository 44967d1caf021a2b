use once_cell::sync::Lazy;
use poise::serenity_prelude as serenity;
use rand::Rng;
use regex::Regex;
use tracing::warn;

use crate::error::BotError;
use crate::{Context, Error};

const NUMBER_EMOJIS: [&str; 10] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟"];

const HEADS_IMAGE: &str =
    "https://upload.wikimedia.org/wikipedia/commons/thumb/a/a0/2006_Quarter_Proof.png/780px-2006_Quarter_Proof.png";
const TAILS_IMAGE: &str =
    "https://upload.wikimedia.org/wikipedia/commons/thumb/6/6f/1792_half_disme_obverse.jpg/780px-1792_half_disme_obverse.jpg";

const FACT_API_URL: &str = "https://techy-api.vercel.app/api/json";

static DICE_SPEC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)d(\d+)$").unwrap());

/// Parse and bounds-check an `NdM` dice spec. Validation happens before any
/// random draw.
pub fn parse_dice_spec(input: &str) -> Result<(u32, u32), BotError> {
    let invalid = || BotError::InvalidDiceSpec {
        input: input.to_string(),
    };

    let lowered = input.trim().to_lowercase();
    let caps = DICE_SPEC.captures(&lowered).ok_or_else(invalid)?;
    let dice: u32 = caps[1].parse().map_err(|_| invalid())?;
    let sides: u32 = caps[2].parse().map_err(|_| invalid())?;

    if !(1..=25).contains(&dice) || !(1..=100).contains(&sides) {
        return Err(BotError::DiceOutOfRange { dice, sides });
    }
    Ok((dice, sides))
}

pub fn roll_dice(dice: u32, sides: u32, rng: &mut impl Rng) -> Vec<u32> {
    (0..dice).map(|_| rng.gen_range(1..=sides)).collect()
}

/// Creates a poll with up to 10 options
#[allow(clippy::too_many_arguments)]
#[poise::command(slash_command, guild_only)]
pub async fn poll(
    ctx: Context<'_>,
    #[description = "What to ask"] question: String,
    #[description = "First option"] option1: String,
    #[description = "Second option"] option2: String,
    #[description = "Third option"] option3: Option<String>,
    #[description = "Fourth option"] option4: Option<String>,
    #[description = "Fifth option"] option5: Option<String>,
    #[description = "Sixth option"] option6: Option<String>,
    #[description = "Seventh option"] option7: Option<String>,
    #[description = "Eighth option"] option8: Option<String>,
    #[description = "Ninth option"] option9: Option<String>,
    #[description = "Tenth option"] option10: Option<String>,
) -> Result<(), Error> {
    let options: Vec<String> = [
        Some(option1),
        Some(option2),
        option3,
        option4,
        option5,
        option6,
        option7,
        option8,
        option9,
        option10,
    ]
    .into_iter()
    .flatten()
    .collect();

    if options.len() < 2 || options.len() > NUMBER_EMOJIS.len() {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ Please provide between 2 and 10 options for the poll.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let listing = options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{} {}", NUMBER_EMOJIS[i], option))
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title(format!("📊 Poll: {}", question))
        .description(listing)
        .color(0x71368a)
        .timestamp(serenity::Timestamp::now())
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Poll started by {}",
            ctx.author().display_name()
        )));

    let reply = ctx.send(poise::CreateReply::default().embed(embed)).await?;
    let message = reply.message().await?;

    for emoji in NUMBER_EMOJIS.iter().take(options.len()) {
        message
            .react(
                ctx.serenity_context(),
                serenity::ReactionType::Unicode(emoji.to_string()),
            )
            .await?;
    }

    Ok(())
}

/// Flips a coin
#[poise::command(slash_command)]
pub async fn coinflip(ctx: Context<'_>) -> Result<(), Error> {
    let (result, image) = if rand::random::<bool>() {
        ("Heads", HEADS_IMAGE)
    } else {
        ("Tails", TAILS_IMAGE)
    };

    let embed = serenity::CreateEmbed::new()
        .title("Coin Flip")
        .description(format!("The coin landed on **{}**!", result))
        .color(0xf1c40f)
        .timestamp(serenity::Timestamp::now())
        .thumbnail(image);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Rolls dice in NdM format (e.g. 2d6)
#[poise::command(slash_command)]
pub async fn rolldice(
    ctx: Context<'_>,
    #[description = "Dice to roll, e.g. 2d6"] dice: String,
) -> Result<(), Error> {
    let (count, sides) = match parse_dice_spec(&dice) {
        Ok(spec) => spec,
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

    let rolls = {
        let mut rng = rand::thread_rng();
        roll_dice(count, sides, &mut rng)
    };
    let total: u32 = rolls.iter().sum();
    let rolls_list = rolls
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let embed = serenity::CreateEmbed::new()
        .title(format!("🎲 Dice Roll: {}", dice))
        .description(format!("**Total:** {}\n**Rolls:** {}", total, rolls_list))
        .color(0x992d22)
        .timestamp(serenity::Timestamp::now());

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[derive(serde::Deserialize)]
struct TechFact {
    message: String,
}

/// Fetches a random tech fact
#[poise::command(slash_command)]
pub async fn techfact(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;

    match fetch_fact().await {
        Ok(fact) => {
            let embed = serenity::CreateEmbed::new()
                .title("💡 Tech Fact")
                .description(fact)
                .color(0x3498db)
                .timestamp(serenity::Timestamp::now());
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            warn!("Tech fact fetch failed: {}", e);
            ctx.send(
                poise::CreateReply::default()
                    .content("❌ Could not fetch a tech fact at this time.")
                    .ephemeral(true),
            )
            .await?;
        }
    }

    Ok(())
}

async fn fetch_fact() -> std::result::Result<String, reqwest::Error> {
    let fact: TechFact = reqwest::get(FACT_API_URL).await?.json().await?;
    Ok(fact.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_dice_spec() {
        assert_eq!(parse_dice_spec("2d6").unwrap(), (2, 6));
        assert_eq!(parse_dice_spec("25d100").unwrap(), (25, 100));
        // Input is lowercased first
        assert_eq!(parse_dice_spec("3D8").unwrap(), (3, 8));
    }

    #[test]
    fn test_parse_dice_spec_rejects_malformed_input() {
        for input in ["d6", "2d", "2x6", "two dice", "", "2d6d8"] {
            assert!(
                matches!(parse_dice_spec(input), Err(BotError::InvalidDiceSpec { .. })),
                "expected '{}' to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_parse_dice_spec_rejects_out_of_range() {
        for input in ["0d6", "26d6", "2d0", "2d101"] {
            assert!(
                matches!(parse_dice_spec(input), Err(BotError::DiceOutOfRange { .. })),
                "expected '{}' to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_roll_dice_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let rolls = roll_dice(25, 100, &mut rng);
        assert_eq!(rolls.len(), 25);
        assert!(rolls.iter().all(|r| (1..=100).contains(r)));

        // Single-sided dice always roll 1
        assert_eq!(roll_dice(3, 1, &mut rng), vec![1, 1, 1]);
    }

    #[test]
    fn test_tech_fact_payload_shape() {
        let fact: TechFact =
            serde_json::from_str(r#"{"message": "Rust has no null."}"#).unwrap();
        assert_eq!(fact.message, "Rust has no null.");
    }
}
