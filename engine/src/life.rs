use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub const SAVE_SLOTS: u8 = 3;

/// Vital state without payload, as shown and as chosen by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vital {
    Alive,
    #[serde(alias = "ko")]
    Unconscious,
    Stable,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveKind {
    Success,
    Failure,
}

/// Marked death-save slots, each a subset of `1..=3`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeathSaves {
    #[serde(default)]
    pub successes: BTreeSet<u8>,
    #[serde(default)]
    pub failures: BTreeSet<u8>,
}

impl DeathSaves {
    fn slots_mut(&mut self, kind: SaveKind) -> &mut BTreeSet<u8> {
        match kind {
            SaveKind::Success => &mut self.successes,
            SaveKind::Failure => &mut self.failures,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.successes.is_empty() && self.failures.is_empty()
    }
}

/// Death saves only exist while unconscious.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LifeState {
    #[default]
    Alive,
    Unconscious { saves: DeathSaves },
    Stable,
    Dead,
}

impl LifeState {
    pub fn vital(&self) -> Vital {
        match self {
            LifeState::Alive => Vital::Alive,
            LifeState::Unconscious { .. } => Vital::Unconscious,
            LifeState::Stable => Vital::Stable,
            LifeState::Dead => Vital::Dead,
        }
    }

    pub fn death_saves(&self) -> Option<&DeathSaves> {
        match self {
            LifeState::Unconscious { saves } => Some(saves),
            _ => None,
        }
    }

    fn unconscious() -> Self {
        LifeState::Unconscious { saves: DeathSaves::default() }
    }
}

/// What a death-save toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathSaveOutcome {
    /// Not unconscious, or the slot is outside `1..=3`.
    Ignored,
    Recorded,
    Died,
    Stabilized,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Health {
    pub current_hp: Option<u32>,
    pub max_hp: Option<u32>,
    pub state: LifeState,
}

impl Health {
    pub fn new(max_hp: u32) -> Self {
        Self {
            current_hp: Some(max_hp),
            max_hp: Some(max_hp),
            state: LifeState::Alive,
        }
    }

    fn tracks_max(&self) -> bool {
        self.max_hp.is_some_and(|m| m > 0)
    }
}

/// Store a new current HP and apply the HP-driven transitions. Returns true
/// when the vital state changed.
///
/// Knock-out fires only on the edge from positive HP to 0, and only for a
/// conscious creature; a stable or dead one at 0 HP stays where it is.
pub fn set_current_hp(
    name: &str,
    health: &mut Health,
    hp: Option<u32>,
    mut log: impl FnMut(String),
) -> bool {
    let before = health.current_hp;
    health.current_hp = hp;
    let Some(hp) = hp else {
        return false;
    };

    if hp == 0 {
        let edge = before.is_some_and(|b| b > 0);
        if edge && health.tracks_max() && health.state == LifeState::Alive {
            health.state = LifeState::unconscious();
            log(format!("{} drops to 0 HP and falls unconscious", name));
            return true;
        }
        return false;
    }

    let wakes = match health.state {
        LifeState::Unconscious { .. } | LifeState::Dead => true,
        LifeState::Stable => hp > 1,
        LifeState::Alive => false,
    };
    if wakes {
        health.state = LifeState::Alive;
        log(format!("{} is back up at {} HP", name, hp));
    }
    wakes
}

/// Manual state change; HP is adjusted to stay consistent with the state.
pub fn set_state(name: &str, health: &mut Health, target: Vital, mut log: impl FnMut(String)) {
    match target {
        Vital::Alive => {
            if health.current_hp == Some(0) {
                health.current_hp = Some(1);
            }
            health.state = LifeState::Alive;
        }
        Vital::Unconscious => {
            health.current_hp = Some(0);
            health.state = LifeState::unconscious();
        }
        Vital::Stable => {
            health.current_hp = Some(1);
            health.state = LifeState::Stable;
        }
        Vital::Dead => {
            health.current_hp = Some(0);
            health.state = LifeState::Dead;
        }
    }
    log(format!("{} is now {:?}", name, target));
}

/// Flip one death-save slot. Three marks of a kind resolve immediately.
pub fn toggle_death_save(
    name: &str,
    health: &mut Health,
    kind: SaveKind,
    slot: u8,
    mut log: impl FnMut(String),
) -> DeathSaveOutcome {
    if !(1..=SAVE_SLOTS).contains(&slot) {
        return DeathSaveOutcome::Ignored;
    }
    let LifeState::Unconscious { saves } = &mut health.state else {
        return DeathSaveOutcome::Ignored;
    };

    let slots = saves.slots_mut(kind);
    if !slots.remove(&slot) {
        slots.insert(slot);
    }

    if saves.failures.len() >= SAVE_SLOTS as usize {
        health.state = LifeState::Dead;
        health.current_hp = Some(0);
        log(format!("{} fails three death saves and dies", name));
        return DeathSaveOutcome::Died;
    }
    if saves.successes.len() >= SAVE_SLOTS as usize {
        health.state = LifeState::Stable;
        health.current_hp = Some(1);
        log(format!("{} succeeds three death saves and is stable", name));
        return DeathSaveOutcome::Stabilized;
    }
    DeathSaveOutcome::Recorded
}

/// Lower HP by `amount`, saturating at 0.
pub fn apply_damage(name: &str, health: &mut Health, amount: u32, log: impl FnMut(String)) -> bool {
    match health.current_hp {
        Some(cur) if amount > 0 => {
            set_current_hp(name, health, Some(cur.saturating_sub(amount)), log)
        }
        _ => false,
    }
}

/// Raise HP by `amount`, capped at max HP when it is tracked.
pub fn heal(name: &str, health: &mut Health, amount: u32, log: impl FnMut(String)) -> bool {
    let Some(cur) = health.current_hp else {
        return false;
    };
    if amount == 0 {
        return false;
    }
    let mut next = cur.saturating_add(amount);
    if let Some(max) = health.max_hp.filter(|m| *m > 0) {
        next = next.min(max.max(cur));
    }
    set_current_hp(name, health, Some(next), log)
}
