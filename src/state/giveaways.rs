use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use poise::serenity_prelude::{ChannelId, MessageId, UserId};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{BotError, Result};

/// Parse a duration spec of the form `<integer><unit>` with unit s/m/h/d.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || BotError::InvalidDuration {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    let mut chars = trimmed.chars();
    let unit = chars.next_back().ok_or_else(invalid)?;
    let magnitude: i64 = chars.as_str().parse().map_err(|_| invalid())?;
    if magnitude < 1 {
        return Err(invalid());
    }

    let seconds = match unit.to_ascii_lowercase() {
        's' => magnitude,
        'm' => magnitude * 60,
        'h' => magnitude * 3600,
        'd' => magnitude * 86400,
        _ => return Err(invalid()),
    };

    Ok(Duration::seconds(seconds))
}

/// A giveaway still waiting for its end time
#[derive(Debug, Clone)]
pub struct ActiveGiveaway {
    pub prize: String,
    pub end_time: DateTime<Utc>,
    pub winners: usize,
    pub channel_id: ChannelId,
}

/// Registry of running and finished giveaways, keyed by the announcement
/// message ID. Completed snapshots are kept for the whole process lifetime so
/// `/giveaway reroll` keeps working; there is deliberately no eviction.
#[derive(Debug, Default)]
pub struct GiveawayStore {
    active: HashMap<MessageId, ActiveGiveaway>,
    completed: HashMap<MessageId, Vec<UserId>>,
}

impl GiveawayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly announced giveaway
    pub fn start(&mut self, message_id: MessageId, giveaway: ActiveGiveaway) {
        self.active.insert(message_id, giveaway);
    }

    pub fn get_active(&self, message_id: MessageId) -> Option<&ActiveGiveaway> {
        self.active.get(&message_id)
    }

    /// Active giveaways ordered by end time (soonest first)
    pub fn list_active(&self) -> Vec<(MessageId, ActiveGiveaway)> {
        let mut entries: Vec<_> = self
            .active
            .iter()
            .map(|(id, g)| (*id, g.clone()))
            .collect();
        entries.sort_by_key(|(_, g)| g.end_time);
        entries
    }

    /// Message IDs of giveaways whose end time has passed
    pub fn due(&self, now: DateTime<Utc>) -> Vec<MessageId> {
        self.active
            .iter()
            .filter(|(_, g)| g.end_time <= now)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Drop an active entry without recording a snapshot. Used when the
    /// announcement message has been deleted before the giveaway ended.
    pub fn discard(&mut self, message_id: MessageId) -> Option<ActiveGiveaway> {
        self.active.remove(&message_id)
    }

    /// Move a giveaway from active to completed, snapshotting its
    /// participants. The snapshot is recorded even when empty so a later
    /// reroll reports "no participants" rather than "not a giveaway".
    pub fn complete(
        &mut self,
        message_id: MessageId,
        participants: Vec<UserId>,
    ) -> Option<ActiveGiveaway> {
        self.completed.insert(message_id, participants);
        self.active.remove(&message_id)
    }

    /// Pick a new winner from a completed giveaway's snapshot. Rerolls draw
    /// with replacement: calling this repeatedly may repeat a winner.
    pub fn reroll(&self, message_id: MessageId, rng: &mut impl Rng) -> Result<UserId> {
        let participants =
            self.completed
                .get(&message_id)
                .ok_or(BotError::GiveawayNotCompleted {
                    message_id: message_id.get(),
                })?;

        participants
            .choose(rng)
            .copied()
            .ok_or(BotError::NoParticipants {
                message_id: message_id.get(),
            })
    }
}

/// Select `count` winners uniformly at random without replacement. Asking for
/// more winners than participants returns everyone.
pub fn draw_winners(participants: &[UserId], count: usize, rng: &mut impl Rng) -> Vec<UserId> {
    participants
        .choose_multiple(rng, count.min(participants.len()))
        .copied()
        .collect()
}

pub type SharedGiveawayStore = Arc<tokio::sync::RwLock<GiveawayStore>>;

pub fn create_shared_giveaway_store() -> SharedGiveawayStore {
    Arc::new(tokio::sync::RwLock::new(GiveawayStore::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn giveaway(end_time: DateTime<Utc>) -> ActiveGiveaway {
        ActiveGiveaway {
            prize: "Nitro".to_string(),
            end_time,
            winners: 1,
            channel_id: ChannelId::new(10),
        }
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_duration("10m").unwrap(), Duration::seconds(600));
        assert_eq!(parse_duration("2h").unwrap(), Duration::seconds(7200));
        assert_eq!(parse_duration("3d").unwrap(), Duration::seconds(259200));
        // Unit is case-insensitive, like the rest of the command input
        assert_eq!(parse_duration("5M").unwrap(), Duration::seconds(300));
    }

    #[test]
    fn test_parse_duration_rejects_bad_input() {
        for input in ["10x", "abc", "", "h", "1.5h", "-5s", "0m", "10"] {
            assert!(
                matches!(parse_duration(input), Err(BotError::InvalidDuration { .. })),
                "expected '{}' to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_due_selects_by_end_time() {
        let now = Utc::now();
        let mut store = GiveawayStore::new();
        store.start(MessageId::new(1), giveaway(now - Duration::seconds(5)));
        store.start(MessageId::new(2), giveaway(now + Duration::seconds(60)));

        let due = store.due(now);
        assert_eq!(due, vec![MessageId::new(1)]);
        // Not resolved yet: the entry stays active until completed
        assert!(store.get_active(MessageId::new(1)).is_some());
    }

    #[test]
    fn test_empty_completion_reports_no_participants() {
        let mut store = GiveawayStore::new();
        let mut rng = StdRng::seed_from_u64(7);
        store.start(MessageId::new(1), giveaway(Utc::now()));
        store.complete(MessageId::new(1), Vec::new());

        assert!(store.get_active(MessageId::new(1)).is_none());
        // An empty snapshot exists, so the failure is NoParticipants
        assert!(matches!(
            store.reroll(MessageId::new(1), &mut rng),
            Err(BotError::NoParticipants { .. })
        ));
        // An unknown ID is a different failure
        assert!(matches!(
            store.reroll(MessageId::new(2), &mut rng),
            Err(BotError::GiveawayNotCompleted { .. })
        ));
    }

    #[test]
    fn test_reroll_draws_from_snapshot_with_replacement() {
        let mut store = GiveawayStore::new();
        let mut rng = StdRng::seed_from_u64(42);
        let entrants = vec![UserId::new(1), UserId::new(2), UserId::new(3)];
        store.start(MessageId::new(9), giveaway(Utc::now()));
        store.complete(MessageId::new(9), entrants.clone());

        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let winner = store.reroll(MessageId::new(9), &mut rng).unwrap();
            assert!(entrants.contains(&winner));
            seen.insert(winner);
        }
        // With replacement, many draws cover the whole snapshot
        assert_eq!(seen.len(), entrants.len());
    }

    #[test]
    fn test_draw_winners_without_replacement() {
        let mut rng = StdRng::seed_from_u64(3);
        let entrants = vec![UserId::new(1), UserId::new(2), UserId::new(3)];

        let winners = draw_winners(&entrants, 2, &mut rng);
        assert_eq!(winners.len(), 2);
        assert_ne!(winners[0], winners[1]);

        // Asking for more winners than entrants yields everyone once
        let all = draw_winners(&entrants, 10, &mut rng);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_discard_drops_without_snapshot() {
        let mut store = GiveawayStore::new();
        let mut rng = StdRng::seed_from_u64(1);
        store.start(MessageId::new(5), giveaway(Utc::now()));

        assert!(store.discard(MessageId::new(5)).is_some());
        assert!(matches!(
            store.reroll(MessageId::new(5), &mut rng),
            Err(BotError::GiveawayNotCompleted { .. })
        ));
    }
}
