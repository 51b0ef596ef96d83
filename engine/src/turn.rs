//! Turn and round engine on top of [`Encounter`].

use tracing::debug;

use crate::combatant::{Combatant, LEGENDARY_SLOTS};
use crate::encounter::Encounter;
use crate::markers::Marker;

/// What a call to [`Encounter::next_turn`] changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnReport {
    /// Index of the combatant whose turn it now is.
    pub active: Option<usize>,
    pub new_round: bool,
    /// Markers that ran out on the combatant whose turn ended.
    pub expired: Vec<Marker>,
}

impl Encounter {
    /// Start or pause the clock.
    pub fn toggle_running(&mut self) -> bool {
        self.is_running = !self.is_running;
        let event = if self.is_running {
            "Encounter started"
        } else {
            "Encounter paused"
        };
        self.record(event);
        self.is_running
    }

    /// One second of the clock. Does nothing while paused.
    pub fn tick(&mut self) {
        if self.is_running {
            self.encounter_time += 1;
            self.turn_time += 1;
        }
    }

    /// Hand the turn to combatant `index` and reset its per-turn resources.
    /// `autosave` receives the round and the 1-based turn number.
    pub fn change_turn(&mut self, index: usize, mut autosave: impl FnMut(u32, usize)) {
        let Some(combatant) = self.roster.at_mut(index) else {
            return;
        };
        combatant.begin_turn();
        let name = combatant.name.clone();
        self.active = index;
        self.turn_time = 0;
        self.record(format!("Round {}: {}'s turn", self.round, name));
        autosave(self.round, index + 1);
    }

    /// Close the active combatant's turn, roll the round over when everyone
    /// has acted, and move to the next combatant in order.
    pub fn next_turn(&mut self, autosave: impl FnMut(u32, usize)) -> TurnReport {
        let len = self.roster.len();
        if len == 0 {
            return TurnReport::default();
        }
        if self.active >= len {
            self.active = 0;
        }

        let turn_time = self.turn_time;
        let mut report = TurnReport::default();
        let mut owner = String::new();
        if let Some(current) = self.roster.at_mut(self.active) {
            if !current.has_acted {
                report.expired = finish_turn(current, turn_time);
                owner = current.name.clone();
            }
        }
        for m in &report.expired {
            self.record(format!("{} on {} has expired", m.label, owner));
        }

        if self.roster.iter().all(|c| c.has_acted) {
            self.round += 1;
            for c in self.roster.iter_mut() {
                c.has_acted = false;
                c.stats.round_count += 1;
                if c.is_legendary() {
                    c.legendary_actions = [false; LEGENDARY_SLOTS];
                }
            }
            report.new_round = true;
            self.record(format!("Round {} begins", self.round));
        }

        let next = (self.active + 1) % len;
        self.change_turn(next, autosave);
        report.active = Some(next);
        report
    }

    /// Step back one place in the order. Nothing done by `next_turn` is
    /// undone; the combatant simply gets a fresh turn.
    pub fn previous_turn(&mut self, autosave: impl FnMut(u32, usize)) -> Option<usize> {
        let len = self.roster.len();
        if len == 0 {
            return None;
        }
        let prev = if self.active == 0 || self.active >= len {
            len - 1
        } else {
            self.active - 1
        };
        self.change_turn(prev, autosave);
        Some(prev)
    }
}

fn finish_turn(c: &mut Combatant, turn_time: u64) -> Vec<Marker> {
    c.stats.cumulative_turn_time += turn_time;
    c.stats.turn_count += 1;
    c.has_acted = true;
    let mut expired = c.tokens.decay();
    expired.extend(c.conditions.decay());
    debug!(
        name = %c.name,
        turns = c.stats.turn_count,
        seconds = c.stats.cumulative_turn_time,
        "turn finished"
    );
    expired
}
