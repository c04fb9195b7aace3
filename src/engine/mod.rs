//! # Engine
//!
//! Everything the game does, independent of how lines arrive.
//!
//! Leaf to root:
//! - [`rng`] - seed keys and keyed generators; the only source of randomness
//! - [`types`] - players, items, boxes, monsters
//! - [`world`] - zones, the map viewport, movement
//! - [`loot`] - box catalog, shop offers, box rewards, shrine offers
//! - [`combat`] - spawn and one attack exchange
//! - [`flavor`] - bestiary flavor text with a seeded fallback
//! - [`commands`] - [`GameState`] and [`dispatch`]
//!
//! Collaborator plumbing:
//! - [`storage`] - [`PlayerRepository`] and the sled-backed [`PlayerStore`]
//! - [`migration`] - versioned transforms for stored player records
//! - [`session`] - load, dispatch, save
//! - [`sessions`] - per-player session registry

pub mod combat;
pub mod commands;
pub mod errors;
pub mod flavor;
pub mod loot;
pub mod migration;
pub mod rng;
pub mod session;
pub mod sessions;
pub mod storage;
pub mod types;
pub mod world;

pub use commands::{dispatch, GameState};
pub use errors::EngineError;
pub use flavor::{FlavorSource, NoFlavor};
pub use session::{Session, SessionOptions};
pub use sessions::SessionRegistry;
pub use storage::{PlayerRepository, PlayerStore, PlayerStoreBuilder};
pub use types::{InventoryEntry, Item, Player};
