//! Live state synchronization
//!
//! [`LiveState`] is the observable in-memory tree; [`StateSync`] hydrates it
//! from the local store at startup and runs the consumer that persists every
//! change as the current campaign.

pub mod domains;
pub mod migrate;
pub mod persist;
pub mod state;

pub use domains::{extract_persisted, PERSISTED_DOMAINS};
pub use migrate::{migrate_campaign_data, needs_migration};
pub use persist::{Hydration, PersistenceHandle, StateSync};
pub use state::{LiveState, StateTree};
