use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use poise::serenity_prelude::{ChannelId, GuildId, MessageId, UserId};

use crate::error::{BotError, Result};

/// Parse an event start time given as `YYYY-MM-DD HH:MM` in UTC.
pub fn parse_start_time(input: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(input.trim(), "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|_| BotError::BadTimeFormat {
            input: input.to_string(),
        })
}

/// Reminder thresholds, fired at most once per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    DayBefore,
    HourBefore,
}

impl Milestone {
    /// How long before the start time this milestone becomes due
    pub fn lead(self) -> Duration {
        match self {
            Milestone::DayBefore => Duration::hours(24),
            Milestone::HourBefore => Duration::hours(1),
        }
    }

    /// Human-readable lead time for the reminder message
    pub fn notice(self) -> &'static str {
        match self {
            Milestone::DayBefore => "24 hours",
            Milestone::HourBefore => "1 hour",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventEntry {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub going: Vec<UserId>,
    pub interested: Vec<UserId>,
    pub reminders_sent: Vec<Milestone>,
}

impl EventEntry {
    pub fn new(
        title: String,
        start_time: DateTime<Utc>,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Self {
        Self {
            title,
            start_time,
            guild_id,
            channel_id,
            going: Vec::new(),
            interested: Vec::new(),
            reminders_sent: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Rsvp {
    Going,
    Interested,
}

/// What an RSVP click did. The `Already*` variants report existing state
/// without mutating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpOutcome {
    NowGoing,
    NowInterested,
    AlreadyGoing,
    AlreadyInterestedOrGoing,
}

/// A reminder the sweep decided to send
#[derive(Debug, Clone)]
pub struct DueReminder {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub title: String,
    pub milestone: Milestone,
    pub recipients: Vec<UserId>,
}

/// Result of one sweep pass
#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// Events whose start time has passed; already removed from the store
    pub expired: Vec<(MessageId, EventEntry)>,
    /// Reminders that became due this pass; milestones already recorded
    pub reminders: Vec<DueReminder>,
}

/// Registry of upcoming events, keyed by the announcement message ID.
/// Entries live until their start time passes or the event is canceled.
#[derive(Debug, Default)]
pub struct EventStore {
    events: HashMap<MessageId, EventEntry>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, message_id: MessageId, entry: EventEntry) {
        self.events.insert(message_id, entry);
    }

    /// Apply an RSVP click. A participant is never in both lists: choosing
    /// "going" moves them out of "interested".
    pub fn rsvp(&mut self, message_id: MessageId, user: UserId, choice: Rsvp) -> Result<RsvpOutcome> {
        let entry = self
            .events
            .get_mut(&message_id)
            .ok_or(BotError::EventExpired)?;

        match choice {
            Rsvp::Going => {
                if entry.going.contains(&user) {
                    return Ok(RsvpOutcome::AlreadyGoing);
                }
                entry.going.push(user);
                entry.interested.retain(|u| *u != user);
                Ok(RsvpOutcome::NowGoing)
            }
            Rsvp::Interested => {
                if entry.interested.contains(&user) || entry.going.contains(&user) {
                    return Ok(RsvpOutcome::AlreadyInterestedOrGoing);
                }
                entry.interested.push(user);
                Ok(RsvpOutcome::NowInterested)
            }
        }
    }

    /// Remove an event ahead of its start time
    pub fn cancel(&mut self, message_id: MessageId) -> Result<EventEntry> {
        self.events
            .remove(&message_id)
            .ok_or(BotError::EventNotFound {
                message_id: message_id.get(),
            })
    }

    /// Upcoming events ordered by start time (soonest first)
    pub fn list(&self) -> Vec<(MessageId, EventEntry)> {
        let mut entries: Vec<_> = self
            .events
            .iter()
            .map(|(id, e)| (*id, e.clone()))
            .collect();
        entries.sort_by_key(|(_, e)| e.start_time);
        entries
    }

    pub fn details(&self, message_id: MessageId) -> Result<EventEntry> {
        self.events
            .get(&message_id)
            .cloned()
            .ok_or(BotError::EventNotFound {
                message_id: message_id.get(),
            })
    }

    /// One pass of the periodic sweep: delete entries whose start time has
    /// passed, and mark at most one newly due milestone per entry. The
    /// milestone is recorded here, so it fires exactly once even if the
    /// caller fails to deliver the reminder.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();

        let ids: Vec<MessageId> = self.events.keys().copied().collect();
        for message_id in ids {
            let started = self
                .events
                .get(&message_id)
                .is_some_and(|e| now >= e.start_time);
            if started {
                if let Some(entry) = self.events.remove(&message_id) {
                    outcome.expired.push((message_id, entry));
                }
                continue;
            }

            let Some(entry) = self.events.get_mut(&message_id) else {
                continue;
            };

            for milestone in [Milestone::DayBefore, Milestone::HourBefore] {
                if entry.reminders_sent.contains(&milestone) {
                    continue;
                }
                if now >= entry.start_time - milestone.lead() {
                    entry.reminders_sent.push(milestone);
                    let mut recipients = entry.going.clone();
                    recipients.extend(entry.interested.iter().copied());
                    outcome.reminders.push(DueReminder {
                        message_id,
                        channel_id: entry.channel_id,
                        title: entry.title.clone(),
                        milestone,
                        recipients,
                    });
                    // At most one milestone per entry per pass
                    break;
                }
            }
        }

        outcome
    }
}

pub type SharedEventStore = Arc<tokio::sync::RwLock<EventStore>>;

pub fn create_shared_event_store() -> SharedEventStore {
    Arc::new(tokio::sync::RwLock::new(EventStore::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start_time: DateTime<Utc>) -> EventEntry {
        EventEntry::new(
            "Game night".to_string(),
            start_time,
            GuildId::new(1),
            ChannelId::new(2),
        )
    }

    #[test]
    fn test_parse_start_time() {
        let parsed = parse_start_time("2025-12-25 18:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-12-25T18:00:00+00:00");

        assert!(matches!(
            parse_start_time("25/12/2025 18:00"),
            Err(BotError::BadTimeFormat { .. })
        ));
        assert!(matches!(
            parse_start_time("tomorrow"),
            Err(BotError::BadTimeFormat { .. })
        ));
    }

    #[test]
    fn test_rsvp_going_moves_out_of_interested() {
        let mut store = EventStore::new();
        let id = MessageId::new(1);
        let user = UserId::new(7);
        store.create(id, entry(Utc::now() + Duration::hours(2)));

        assert_eq!(
            store.rsvp(id, user, Rsvp::Interested).unwrap(),
            RsvpOutcome::NowInterested
        );
        assert_eq!(store.rsvp(id, user, Rsvp::Going).unwrap(), RsvpOutcome::NowGoing);

        let details = store.details(id).unwrap();
        assert_eq!(details.going, vec![user]);
        assert!(details.interested.is_empty());
    }

    #[test]
    fn test_rsvp_repeats_are_noops() {
        let mut store = EventStore::new();
        let id = MessageId::new(1);
        let user = UserId::new(7);
        store.create(id, entry(Utc::now() + Duration::hours(2)));

        store.rsvp(id, user, Rsvp::Going).unwrap();
        assert_eq!(
            store.rsvp(id, user, Rsvp::Going).unwrap(),
            RsvpOutcome::AlreadyGoing
        );
        // Interested after going is also refused
        assert_eq!(
            store.rsvp(id, user, Rsvp::Interested).unwrap(),
            RsvpOutcome::AlreadyInterestedOrGoing
        );
        assert_eq!(store.details(id).unwrap().going.len(), 1);
    }

    #[test]
    fn test_rsvp_on_missing_event_is_expired() {
        let mut store = EventStore::new();
        assert!(matches!(
            store.rsvp(MessageId::new(99), UserId::new(1), Rsvp::Going),
            Err(BotError::EventExpired)
        ));
    }

    #[test]
    fn test_sweep_reminder_scenario() {
        // Event 30 hours out: no reminder at minute 1, none at hour 6,
        // exactly one 24h reminder at hour 25, never repeated.
        let created = Utc::now();
        let start = created + Duration::hours(30);
        let mut store = EventStore::new();
        let id = MessageId::new(1);
        let mut event = entry(start);
        event.going.push(UserId::new(5));
        store.create(id, event);

        let pass1 = store.sweep(created + Duration::minutes(1));
        assert!(pass1.reminders.is_empty());
        assert!(pass1.expired.is_empty());

        let pass2 = store.sweep(created + Duration::hours(6));
        assert!(pass2.reminders.is_empty());

        let pass3 = store.sweep(created + Duration::hours(25));
        assert_eq!(pass3.reminders.len(), 1);
        assert_eq!(pass3.reminders[0].milestone, Milestone::DayBefore);
        assert_eq!(pass3.reminders[0].recipients, vec![UserId::new(5)]);

        let pass4 = store.sweep(created + Duration::hours(26));
        assert!(pass4.reminders.is_empty());
    }

    #[test]
    fn test_sweep_fires_one_milestone_per_pass() {
        // Already inside the 1h window: the 24h milestone fires first, the
        // 1h milestone waits for the next pass.
        let now = Utc::now();
        let mut store = EventStore::new();
        let id = MessageId::new(1);
        store.create(id, entry(now + Duration::minutes(30)));

        let first = store.sweep(now);
        assert_eq!(first.reminders.len(), 1);
        assert_eq!(first.reminders[0].milestone, Milestone::DayBefore);

        let second = store.sweep(now + Duration::minutes(1));
        assert_eq!(second.reminders.len(), 1);
        assert_eq!(second.reminders[0].milestone, Milestone::HourBefore);

        let third = store.sweep(now + Duration::minutes(2));
        assert!(third.reminders.is_empty());
    }

    #[test]
    fn test_sweep_expires_started_events() {
        let now = Utc::now();
        let mut store = EventStore::new();
        let id = MessageId::new(1);
        store.create(id, entry(now - Duration::minutes(1)));

        let outcome = store.sweep(now);
        assert_eq!(outcome.expired.len(), 1);
        assert!(outcome.reminders.is_empty());

        // Swept entries are gone: RSVPs now fail as expired
        assert!(matches!(
            store.rsvp(id, UserId::new(1), Rsvp::Going),
            Err(BotError::EventExpired)
        ));
    }

    #[test]
    fn test_list_is_ordered_by_start_time() {
        let now = Utc::now();
        let mut store = EventStore::new();
        store.create(MessageId::new(1), entry(now + Duration::hours(5)));
        store.create(MessageId::new(2), entry(now + Duration::hours(1)));
        store.create(MessageId::new(3), entry(now + Duration::hours(3)));

        let ids: Vec<MessageId> = store.list().into_iter().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec![MessageId::new(2), MessageId::new(3), MessageId::new(1)]
        );
    }

    #[test]
    fn test_cancel_unknown_event() {
        let mut store = EventStore::new();
        assert!(matches!(
            store.cancel(MessageId::new(1)),
            Err(BotError::EventNotFound { .. })
        ));
    }
}
