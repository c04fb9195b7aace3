use std::sync::Arc;

use log::{debug, info, warn};

use super::commands::{dispatch, GameState, DEFAULT_CYCLE};
use super::flavor::FlavorSource;
use super::storage::PlayerRepository;
use super::types::Player;
use super::world::MapSize;
use crate::logutil::escape_log;

/// Per-session settings supplied by the front end.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub map_size: MapSize,
    pub cycle: String,
    /// Save after every line. When off, the player is saved when the session
    /// ends or [`Session::persist`] is called.
    pub autosave: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            map_size: MapSize::default(),
            cycle: DEFAULT_CYCLE.to_string(),
            autosave: true,
        }
    }
}

/// # Player Session
///
/// Wraps one [`GameState`] together with the repository its player came
/// from. A session processes one line at a time: dispatch first, then a
/// best-effort save. Save failures are logged and never reach the player.
///
/// ## Lifecycle
///
/// 1. [`Session::open`] loads the player, or creates a default one and saves
///    it as a baseline
/// 2. [`Session::handle_line`] for each line of input
/// 3. the session is over once `handle_line` reports `ended`
///
/// A store that fails to load a player (unreadable or too-new record) puts
/// the session in memory-only mode so the stored record is never overwritten.
pub struct Session {
    state: GameState,
    repo: Option<Arc<dyn PlayerRepository>>,
    autosave: bool,
    ended: bool,
}

impl Session {
    pub fn open(
        repo: Option<Arc<dyn PlayerRepository>>,
        id: &str,
        name: &str,
        options: SessionOptions,
        flavor: Arc<dyn FlavorSource>,
    ) -> Self {
        let (player, repo) = match repo {
            None => (Player::new(id, name), None),
            Some(repo) => match repo.load(id) {
                Ok(Some(player)) => {
                    info!("Loaded player {}", escape_log(id));
                    (player, Some(repo))
                }
                Ok(None) => {
                    let player = Player::new(id, name);
                    match repo.save(&player) {
                        Ok(()) => info!("Created player {}", escape_log(id)),
                        Err(e) => warn!("Failed to save new player {}: {}", escape_log(id), e),
                    }
                    (player, Some(repo))
                }
                Err(e) => {
                    warn!(
                        "Failed to load player {}: {}; continuing without saving",
                        escape_log(id),
                        e
                    );
                    (Player::new(id, name), None)
                }
            },
        };
        let state = GameState::new(player)
            .with_map_size(options.map_size)
            .with_cycle(options.cycle)
            .with_flavor(flavor);
        Self {
            state,
            repo,
            autosave: options.autosave,
            ended: false,
        }
    }

    /// Dispatch one line, then save if autosave is on (or the session ended).
    pub fn handle_line(&mut self, line: &str) -> (String, bool) {
        let (out, ended) = dispatch(&mut self.state, line);
        if self.autosave || ended {
            self.persist();
        }
        if ended {
            self.ended = true;
            info!("Session ended for {}", escape_log(&self.state.player.id));
        }
        (out, ended)
    }

    /// Best-effort save. Returns whether the player was written.
    pub fn persist(&self) -> bool {
        let Some(repo) = &self.repo else {
            return false;
        };
        match repo.save(&self.state.player) {
            Ok(()) => {
                debug!("Saved player {}", escape_log(&self.state.player.id));
                true
            }
            Err(e) => {
                warn!(
                    "Failed to save player {}: {}",
                    escape_log(&self.state.player.id),
                    e
                );
                false
            }
        }
    }

    /// End the session without a command and save it. Lines sent afterwards
    /// are refused by the registry.
    pub fn close(&mut self) -> bool {
        self.ended = true;
        self.persist()
    }

    pub fn set_cycle(&mut self, cycle: &str) {
        self.state.set_cycle(cycle);
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn player(&self) -> &Player {
        &self.state.player
    }

    pub fn is_persistent(&self) -> bool {
        self.repo.is_some()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}
