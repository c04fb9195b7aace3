//! Registry of live sessions shared by front ends that serve many players.
//!
//! Each player id maps to its own `Arc<Mutex<Session>>`: different players
//! dispatch in parallel, lines for the same player are serialised.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use log::info;

use super::flavor::FlavorSource;
use super::session::{Session, SessionOptions};
use super::storage::PlayerRepository;
use crate::logutil::escape_log;

/// Supplies the cycle tag in force for the next line.
pub type CycleProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// Today's UTC date, `YYYY-MM-DD`. Gives a daily shop.
pub fn utc_day_cycle() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SessionRegistry {
    repo: Option<Arc<dyn PlayerRepository>>,
    flavor: Arc<dyn FlavorSource>,
    options: SessionOptions,
    cycle: CycleProvider,
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionRegistry {
    pub fn new(
        repo: Option<Arc<dyn PlayerRepository>>,
        flavor: Arc<dyn FlavorSource>,
        options: SessionOptions,
    ) -> Self {
        Self {
            repo,
            flavor,
            options,
            cycle: Arc::new(utc_day_cycle),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_cycle_provider(mut self, cycle: CycleProvider) -> Self {
        self.cycle = cycle;
        self
    }

    /// Existing session for `id`, or a newly opened one. The store is only
    /// touched outside the registry lock; if two callers race to open the
    /// same player, the first insert wins.
    pub fn session(&self, id: &str, name: &str) -> Arc<Mutex<Session>> {
        if let Some(existing) = lock(&self.sessions).get(id) {
            return existing.clone();
        }
        let options = SessionOptions {
            cycle: (self.cycle)(),
            ..self.options.clone()
        };
        let opened = Session::open(self.repo.clone(), id, name, options, self.flavor.clone());
        lock(&self.sessions)
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(opened)))
            .clone()
    }

    /// Run one line for player `id`. Sessions that end are dropped from the
    /// registry; the next line opens a fresh one. A line never reaches a
    /// session that has already ended.
    pub fn handle(&self, id: &str, name: &str, line: &str) -> (String, bool) {
        loop {
            let session = self.session(id, name);
            let mut guard = lock(&session);
            if guard.is_ended() {
                drop(guard);
                self.remove_entry(id, &session);
                continue;
            }
            guard.set_cycle(&(self.cycle)());
            let (out, ended) = guard.handle_line(line);
            drop(guard);
            if ended {
                self.remove_entry(id, &session);
            }
            return (out, ended);
        }
    }

    /// Close, save and drop the session for `id`. Returns whether one existed.
    pub fn end(&self, id: &str) -> bool {
        let Some(session) = lock(&self.sessions).get(id).cloned() else {
            return false;
        };
        lock(&session).close();
        self.remove_entry(id, &session);
        true
    }

    /// Drop `session` from the map if it is still the one registered for `id`.
    fn remove_entry(&self, id: &str, session: &Arc<Mutex<Session>>) {
        let mut sessions = lock(&self.sessions);
        if sessions.get(id).is_some_and(|s| Arc::ptr_eq(s, session)) {
            sessions.remove(id);
            info!("Closed session for {}", escape_log(id));
        }
    }

    pub fn active_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_active(&self, id: &str) -> bool {
        lock(&self.sessions).contains_key(id)
    }
}
