use indexmap::IndexMap;

use crate::combatant::Combatant;
use crate::error::{TrackerError, TrackerResult};
use crate::id::CombatantId;

/// Turn-ordered combatants keyed by id. Ids are unique by construction.
///
/// Combatants are only handed out mutably inside the engine, so every edit
/// goes through [`Encounter`](crate::Encounter) and its log:
///
/// ```compile_fail
/// let mut roster = tracker_engine::Roster::new();
/// for c in roster.iter_mut() {
///     c.name.clear();
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: IndexMap<CombatantId, Combatant>,
}

// Turn order is part of a roster's identity; `IndexMap` equality ignores it.
impl PartialEq for Roster {
    fn eq(&self, other: &Self) -> bool {
        self.entries.iter().eq(other.entries.iter())
    }
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.entries.values_mut()
    }

    pub fn get(&self, id: &CombatantId) -> Option<&Combatant> {
        self.entries.get(id)
    }

    pub(crate) fn require_mut(&mut self, id: &CombatantId) -> TrackerResult<&mut Combatant> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| TrackerError::UnknownCombatant(id.to_string()))
    }

    pub fn at(&self, index: usize) -> Option<&Combatant> {
        self.entries.get_index(index).map(|(_, c)| c)
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> Option<&mut Combatant> {
        self.entries.get_index_mut(index).map(|(_, c)| c)
    }

    pub fn index_of(&self, id: &CombatantId) -> Option<usize> {
        self.entries.get_index_of(id)
    }

    pub fn contains(&self, id: &CombatantId) -> bool {
        self.entries.contains_key(id)
    }

    /// Appends at the end of the turn order.
    pub fn push(&mut self, combatant: Combatant) -> TrackerResult<()> {
        if self.entries.contains_key(&combatant.id) {
            return Err(TrackerError::DuplicateId(combatant.id.to_string()));
        }
        self.entries.insert(combatant.id.clone(), combatant);
        Ok(())
    }

    /// Removes while keeping the order of the others. Returns the former
    /// position with the combatant.
    pub fn remove(&mut self, id: &CombatantId) -> Option<(usize, Combatant)> {
        self.entries
            .shift_remove_full(id)
            .map(|(idx, _, combatant)| (idx, combatant))
    }

    /// Stable sort; equal elements keep their current relative order.
    pub fn sort_by(&mut self, mut cmp: impl FnMut(&Combatant, &Combatant) -> std::cmp::Ordering) {
        self.entries.sort_by(|_, a, _, b| cmp(a, b));
    }
}

impl FromIterator<Combatant> for Roster {
    /// Later duplicates of an id receive a fresh id rather than replacing
    /// the earlier entry.
    fn from_iter<I: IntoIterator<Item = Combatant>>(iter: I) -> Self {
        let mut roster = Roster::new();
        for mut c in iter {
            while roster.contains(&c.id) {
                c.id = CombatantId::generate();
            }
            roster.entries.insert(c.id.clone(), c);
        }
        roster
    }
}
