//! Shared fixtures for the integration tests.

use abysm::engine::{dispatch, GameState, Player, PlayerStore};

/// A fresh session for `id` on the default map, pinned to a fixed cycle.
#[allow(dead_code)]
pub fn fresh_state(id: &str) -> GameState {
    GameState::new(Player::new(id, "Tester")).with_cycle("2025-09-10")
}

/// Dispatch a line that must not end the session.
#[allow(dead_code)]
pub fn run(gs: &mut GameState, line: &str) -> String {
    let (out, ended) = dispatch(gs, line);
    assert!(!ended, "'{}' unexpectedly ended the session", line);
    out
}

/// A player store in its own temp dir. Keep the dir alive for the test.
#[allow(dead_code)]
pub fn temp_store() -> (tempfile::TempDir, PlayerStore) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = PlayerStore::open(tmp.path().join("players")).expect("open store");
    (tmp, store)
}
