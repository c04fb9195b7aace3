//! # Abysm - a deterministic text-adventure engine
//!
//! Abysm generates its whole world from seed keys: zones, monsters, shop
//! offers and loot are pure functions of the player id and a few tags, so the
//! same player sees the same world on every machine. A line-oriented command
//! dispatcher plays that world against a persistent player record.
//!
//! ## Features
//!
//! - **Keyed Determinism**: SHA-256 seed keys feeding ChaCha8 streams; no ambient randomness.
//! - **Procedural World**: biome zones with distance-based danger tiers, a bounded map viewport.
//! - **Economy**: a daily rotating box shop, tiered loot with exponential reward scaling, shrines.
//! - **Persistence**: sled-backed player store with versioned record migrations.
//! - **Optional Flavor Text**: bestiary entries from a generative text API, with a seeded fallback.
//!
//! ## Quick Start
//!
//! ```rust
//! use abysm::engine::{dispatch, GameState, Player};
//!
//! let mut state = GameState::new(Player::new("local", "Wanderer")).with_cycle("2025-09-10");
//! let (reply, ended) = dispatch(&mut state, "stats");
//! assert_eq!(reply, "Wanderer: HP 10/10, ATK 2, DEF 1, GOLD 0");
//! assert!(!ended);
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - generation, combat, the dispatcher, sessions and persistence
//! - [`config`] - configuration management and validation
//! - [`validation`] - player id and display name checks
//! - [`logutil`] - single-line log escaping

pub mod config;
pub mod engine;
pub mod logutil;
pub mod validation;
