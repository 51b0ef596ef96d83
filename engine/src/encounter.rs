//! The encounter aggregate: roster, clock, notes and the event log.
//!
//! All edits go through methods here so the roster, the active pointer and
//! the log always change together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::combatant::{Combatant, CombatantType, Resource};
use crate::error::{TrackerError, TrackerResult};
use crate::id::{CombatantId, MarkerId};
use crate::initiative;
use crate::life::{DeathSaveOutcome, SaveKind, Vital};
use crate::markers::MarkerKind;
use crate::roster::Roster;

pub const DEFAULT_ENCOUNTER_NAME: &str = "New Encounter";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    #[serde(default)]
    pub encounter_time: u64,
    #[serde(default = "first_round")]
    pub round: u32,
}

pub(crate) fn first_round() -> u32 {
    1
}

impl LogEntry {
    pub fn now(event: impl Into<String>, encounter_time: u64, round: u32) -> Self {
        Self {
            timestamp: Utc::now(),
            event: event.into(),
            encounter_time,
            round,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Encounter {
    pub name: String,
    pub notes: String,
    pub(crate) roster: Roster,
    pub(crate) round: u32,
    pub(crate) encounter_time: u64,
    pub(crate) turn_time: u64,
    pub(crate) is_running: bool,
    pub(crate) active: usize,
    pub(crate) log: Vec<LogEntry>,
}

impl Default for Encounter {
    fn default() -> Self {
        Self::new(DEFAULT_ENCOUNTER_NAME)
    }
}

impl Encounter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: String::new(),
            roster: Roster::new(),
            round: 1,
            encounter_time: 0,
            turn_time: 0,
            is_running: false,
            active: 0,
            log: Vec::new(),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn encounter_time(&self) -> u64 {
        self.encounter_time
    }

    pub fn turn_time(&self) -> u64 {
        self.turn_time
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> Option<&Combatant> {
        self.roster.at(self.active)
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn combatant(&self, id: &CombatantId) -> Option<&Combatant> {
        self.roster.get(id)
    }

    /// Append an event to the log, stamped with the current clock.
    pub fn record(&mut self, event: impl Into<String>) {
        let event = event.into();
        info!(round = self.round, "{}", event);
        self.log.push(LogEntry::now(event, self.encounter_time, self.round));
    }

    /// Drop everything and start over with an empty roster.
    pub fn reset(&mut self, name: impl Into<String>) {
        *self = Encounter::new(name);
    }

    pub fn add_combatant(&mut self, combatant: Combatant) -> TrackerResult<CombatantId> {
        let id = combatant.id.clone();
        let name = combatant.name.clone();
        self.roster.push(combatant)?;
        self.record(format!("{} joins the encounter", name));
        Ok(id)
    }

    /// The active pointer keeps following the same combatant when an
    /// earlier one leaves, and is clamped when the last one leaves.
    pub fn remove_combatant(&mut self, id: &CombatantId) -> TrackerResult<Combatant> {
        let (pos, removed) = self
            .roster
            .remove(id)
            .ok_or_else(|| TrackerError::UnknownCombatant(id.to_string()))?;
        if pos < self.active {
            self.active -= 1;
        }
        self.active = self.active.min(self.roster.len().saturating_sub(1));
        self.record(format!("{} leaves the encounter", removed.name));
        Ok(removed)
    }

    pub fn duplicate_combatant(&mut self, id: &CombatantId) -> TrackerResult<CombatantId> {
        let copy = self
            .roster
            .get(id)
            .ok_or_else(|| TrackerError::UnknownCombatant(id.to_string()))?
            .duplicate();
        let new_id = self.add_combatant(copy)?;
        self.sort_initiative();
        Ok(new_id)
    }

    /// Re-sort by initiative. The active pointer follows the combatant that
    /// had the turn.
    pub fn sort_initiative(&mut self) {
        let active_id = self.active().map(|c| c.id.clone());
        initiative::sort_roster(&mut self.roster);
        if let Some(idx) = active_id.and_then(|id| self.roster.index_of(&id)) {
            self.active = idx;
        }
    }

    /// Store a committed initiative value and re-sort.
    pub fn commit_initiative(&mut self, id: &CombatantId, value: Option<i32>) -> TrackerResult<()> {
        self.roster.require_mut(id)?.initiative = value;
        self.sort_initiative();
        Ok(())
    }

    pub fn rename(&mut self, id: &CombatantId, name: impl Into<String>) -> TrackerResult<()> {
        self.roster.require_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn set_type(&mut self, id: &CombatantId, ty: CombatantType) -> TrackerResult<()> {
        self.roster.require_mut(id)?.set_type(ty);
        Ok(())
    }

    pub fn set_ac(&mut self, id: &CombatantId, ac: Option<u32>) -> TrackerResult<()> {
        self.roster.require_mut(id)?.ac = ac;
        Ok(())
    }

    pub fn set_max_hp(&mut self, id: &CombatantId, max_hp: Option<u32>) -> TrackerResult<()> {
        self.roster.require_mut(id)?.set_max_hp(max_hp);
        Ok(())
    }

    pub fn set_current_hp(&mut self, id: &CombatantId, hp: Option<u32>) -> TrackerResult<bool> {
        self.with_logged(id, |c, log| c.set_current_hp(hp, log))
    }

    pub fn apply_damage(&mut self, id: &CombatantId, amount: u32) -> TrackerResult<bool> {
        self.with_logged(id, |c, log| c.apply_damage(amount, log))
    }

    pub fn heal(&mut self, id: &CombatantId, amount: u32) -> TrackerResult<bool> {
        self.with_logged(id, |c, log| c.heal(amount, log))
    }

    pub fn set_state(&mut self, id: &CombatantId, target: Vital) -> TrackerResult<()> {
        self.with_logged(id, |c, log| c.set_state(target, log))
    }

    pub fn toggle_death_save(
        &mut self,
        id: &CombatantId,
        kind: SaveKind,
        slot: u8,
    ) -> TrackerResult<DeathSaveOutcome> {
        self.with_logged(id, |c, log| c.toggle_death_save(kind, slot, log))
    }

    pub fn toggle_resource(&mut self, id: &CombatantId, resource: Resource) -> TrackerResult<bool> {
        Ok(self.roster.require_mut(id)?.toggle_resource(resource))
    }

    pub fn set_movement(
        &mut self,
        id: &CombatantId,
        current: Option<u16>,
        max: Option<u16>,
    ) -> TrackerResult<bool> {
        Ok(self.roster.require_mut(id)?.set_movement(current, max))
    }

    pub fn toggle_legendary_action(&mut self, id: &CombatantId, slot: usize) -> TrackerResult<()> {
        self.roster.require_mut(id)?.toggle_legendary_action(slot);
        Ok(())
    }

    pub fn toggle_legendary_resistance(&mut self, id: &CombatantId, slot: usize) -> TrackerResult<()> {
        self.roster.require_mut(id)?.toggle_legendary_resistance(slot);
        Ok(())
    }

    pub fn add_marker(&mut self, id: &CombatantId, kind: MarkerKind) -> TrackerResult<MarkerId> {
        Ok(self.roster.require_mut(id)?.markers_mut(kind).add())
    }

    pub fn remove_marker(
        &mut self,
        id: &CombatantId,
        kind: MarkerKind,
        marker: &MarkerId,
    ) -> TrackerResult<()> {
        self.roster.require_mut(id)?.markers_mut(kind).remove(marker)?;
        Ok(())
    }

    pub fn rename_marker(
        &mut self,
        id: &CombatantId,
        kind: MarkerKind,
        marker: &MarkerId,
        label: impl Into<String>,
    ) -> TrackerResult<()> {
        self.roster.require_mut(id)?.markers_mut(kind).rename(marker, label)
    }

    pub fn set_marker_duration(
        &mut self,
        id: &CombatantId,
        kind: MarkerKind,
        marker: &MarkerId,
        duration: Option<u32>,
    ) -> TrackerResult<()> {
        self.roster
            .require_mut(id)?
            .markers_mut(kind)
            .set_duration(marker, duration)
    }

    pub fn toggle_marker_persistent(
        &mut self,
        id: &CombatantId,
        kind: MarkerKind,
        marker: &MarkerId,
    ) -> TrackerResult<()> {
        self.roster
            .require_mut(id)?
            .markers_mut(kind)
            .toggle_persistent(marker)
    }

    /// Run `f` on one combatant, routing its messages into the event log.
    fn with_logged<T>(
        &mut self,
        id: &CombatantId,
        f: impl FnOnce(&mut Combatant, &mut dyn FnMut(String)) -> T,
    ) -> TrackerResult<T> {
        let (round, at) = (self.round, self.encounter_time);
        let log = &mut self.log;
        let combatant = self.roster.require_mut(id)?;
        let mut sink = |event: String| {
            info!(round = round, "{}", event);
            log.push(LogEntry::now(event, at, round));
        };
        Ok(f(combatant, &mut sink))
    }
}
