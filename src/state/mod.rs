pub mod events;
pub mod giveaways;
pub mod projects;

pub use events::{create_shared_event_store, EventStore, SharedEventStore};
pub use giveaways::{create_shared_giveaway_store, GiveawayStore, SharedGiveawayStore};
pub use projects::{create_shared_project_store, ProjectStore, SharedProjectStore};
