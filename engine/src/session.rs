use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::clock::Ticker;
use crate::encounter::Encounter;

pub type SharedEncounter = Arc<Mutex<Encounter>>;

/// A live encounter whose clock ticks while it is running.
///
/// Each edit holds the lock for its whole duration, so the ticker never sees
/// a half-applied change.
#[derive(Debug)]
pub struct Session {
    encounter: SharedEncounter,
    ticker: Ticker,
    period: Duration,
}

impl Session {
    pub fn new(encounter: Encounter, period: Duration) -> Self {
        let running = encounter.is_running();
        let mut session = Self {
            encounter: Arc::new(Mutex::new(encounter)),
            ticker: Ticker::new(),
            period,
        };
        if running {
            session.start_clock();
        }
        session
    }

    pub fn shared(&self) -> SharedEncounter {
        Arc::clone(&self.encounter)
    }

    pub fn clock_active(&self) -> bool {
        self.ticker.is_active()
    }

    /// Run `f` with exclusive access to the encounter. If `f` starts or
    /// stops the encounter the clock follows.
    pub fn with<T>(&mut self, f: impl FnOnce(&mut Encounter) -> T) -> T {
        let (out, running) = {
            let mut encounter = lock(&self.encounter);
            let out = f(&mut encounter);
            (out, encounter.is_running())
        };
        self.sync_clock(running);
        out
    }

    pub fn snapshot(&self) -> Encounter {
        lock(&self.encounter).clone()
    }

    /// Flip the running flag and start or cancel the clock to match.
    pub fn toggle_running(&mut self) -> bool {
        self.with(Encounter::toggle_running)
    }

    /// Stop the clock and hand back the encounter.
    pub fn close(mut self) -> Encounter {
        self.ticker.stop();
        self.snapshot()
    }

    fn sync_clock(&mut self, running: bool) {
        match (running, self.ticker.is_active()) {
            (true, false) => self.start_clock(),
            (false, true) => self.ticker.stop(),
            _ => {}
        }
    }

    fn start_clock(&mut self) {
        let shared = Arc::clone(&self.encounter);
        self.ticker.start(self.period, move || lock(&shared).tick());
    }
}

fn lock(encounter: &Mutex<Encounter>) -> MutexGuard<'_, Encounter> {
    encounter.lock().unwrap_or_else(PoisonError::into_inner)
}
