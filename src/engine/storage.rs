use std::path::{Path, PathBuf};

use log::{info, warn};
use serde_json::Value;
use sled::IVec;

use super::errors::Result;
use super::migration::{migrate_player_value, CURRENT_PLAYER_DATA_VERSION, DATA_VERSION_FIELD};
use super::types::Player;

const TREE_PLAYERS: &str = "abysm_players";
const PLAYER_PREFIX: &str = "players:";

/// Where the session loads and saves players. Implementations must be
/// idempotent upserts keyed by player id.
pub trait PlayerRepository: Send + Sync {
    /// `Ok(None)` for a player that has never been saved.
    fn load(&self, id: &str) -> Result<Option<Player>>;
    fn save(&self, player: &Player) -> Result<()>;
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct PlayerStoreBuilder {
    path: PathBuf,
    tree: String,
}

impl PlayerStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tree: TREE_PLAYERS.to_string(),
        }
    }

    /// Keep records in a differently named tree (several stores in one db).
    pub fn tree(mut self, name: impl Into<String>) -> Self {
        self.tree = name.into();
        self
    }

    pub fn open(self) -> Result<PlayerStore> {
        PlayerStore::open_with_tree(self.path, &self.tree)
    }
}

/// Outcome of [`PlayerStore::migrate_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub scanned: usize,
    /// Records that were (or, in a dry run, would be) rewritten.
    pub migrated: usize,
    pub up_to_date: usize,
    /// `(player id, error)` for records that could not be migrated.
    pub failures: Vec<(String, String)>,
    pub dry_run: bool,
}

impl MigrationReport {
    pub fn summary(&self) -> String {
        format!(
            "{}scanned {}, migrated {}, up to date {}, failed {}",
            if self.dry_run { "[dry run] " } else { "" },
            self.scanned,
            self.migrated,
            self.up_to_date,
            self.failures.len()
        )
    }
}

/// Sled-backed persistence for player records.
pub struct PlayerStore {
    _db: sled::Db,
    players: sled::Tree,
}

impl PlayerStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_tree(path, TREE_PLAYERS)
    }

    fn open_with_tree<P: AsRef<Path>>(path: P, tree: &str) -> Result<Self> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let players = db.open_tree(tree)?;
        Ok(Self { _db: db, players })
    }

    fn player_key(id: &str) -> Vec<u8> {
        format!("{}{}", PLAYER_PREFIX, id).into_bytes()
    }

    fn encode(player: &Player) -> Result<Vec<u8>> {
        let mut value = serde_json::to_value(player)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                DATA_VERSION_FIELD.to_string(),
                Value::from(CURRENT_PLAYER_DATA_VERSION),
            );
        }
        Ok(serde_json::to_vec(&value)?)
    }

    /// Decode and migrate a stored record. Returns the player and the
    /// version it was stored at.
    fn decode(bytes: &IVec) -> Result<(Player, u32)> {
        let raw: Value = serde_json::from_slice(bytes)?;
        let (value, from) = migrate_player_value(raw)?;
        let mut player: Player = serde_json::from_value(value)?;
        player.clamp_hp();
        Ok((player, from))
    }

    /// Insert or update a player record.
    pub fn put_player(&self, player: &Player) -> Result<()> {
        let bytes = Self::encode(player)?;
        self.players.insert(Self::player_key(&player.id), bytes)?;
        self.players.flush()?;
        Ok(())
    }

    /// Fetch a player record, migrating it in memory if it is older than
    /// this build.
    pub fn get_player(&self, id: &str) -> Result<Option<Player>> {
        let Some(bytes) = self.players.get(Self::player_key(id))? else {
            return Ok(None);
        };
        let (player, _) = Self::decode(&bytes)?;
        Ok(Some(player))
    }

    /// Store raw JSON under a player key. Used to seed legacy records.
    pub fn put_raw(&self, id: &str, value: &Value) -> Result<()> {
        self.players
            .insert(Self::player_key(id), serde_json::to_vec(value)?)?;
        self.players.flush()?;
        Ok(())
    }

    /// Stored JSON for `id` exactly as written, without migration.
    pub fn get_raw(&self, id: &str) -> Result<Option<Value>> {
        match self.players.get(Self::player_key(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// List all player ids currently stored.
    pub fn list_player_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in self.players.scan_prefix(PLAYER_PREFIX.as_bytes()) {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(id) = text.strip_prefix(PLAYER_PREFIX) {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    /// Rewrite every stored record at the current data version. With
    /// `dry_run` nothing is written; the report says what would change.
    pub fn migrate_all(&self, dry_run: bool) -> Result<MigrationReport> {
        let mut report = MigrationReport {
            dry_run,
            ..MigrationReport::default()
        };
        for id in self.list_player_ids()? {
            report.scanned += 1;
            let Some(bytes) = self.players.get(Self::player_key(&id))? else {
                continue;
            };
            match Self::decode(&bytes) {
                Ok((_, from)) if from == CURRENT_PLAYER_DATA_VERSION => report.up_to_date += 1,
                Ok((player, from)) => {
                    if !dry_run {
                        self.put_player(&player)?;
                    }
                    info!(
                        "{} player '{}' v{} -> v{}",
                        if dry_run { "Would migrate" } else { "Migrated" },
                        id,
                        from,
                        CURRENT_PLAYER_DATA_VERSION
                    );
                    report.migrated += 1;
                }
                Err(e) => {
                    warn!("Cannot migrate player '{}': {}", id, e);
                    report.failures.push((id, e.to_string()));
                }
            }
        }
        Ok(report)
    }
}

impl PlayerRepository for PlayerStore {
    fn load(&self, id: &str) -> Result<Option<Player>> {
        self.get_player(id)
    }

    fn save(&self, player: &Player) -> Result<()> {
        self.put_player(player)
    }
}
