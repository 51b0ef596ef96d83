use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};
use crate::id::MarkerId;

pub const DEFAULT_TOKEN_LABEL: &str = "New Token";
pub const DEFAULT_CONDITION_LABEL: &str = "New Condition";

/// Which list a marker lives in. Tokens are freeform notes, conditions are
/// status effects; both behave identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Token,
    Condition,
}

impl MarkerKind {
    pub fn default_label(self) -> &'static str {
        match self {
            MarkerKind::Token => DEFAULT_TOKEN_LABEL,
            MarkerKind::Condition => DEFAULT_CONDITION_LABEL,
        }
    }
}

/// How long a marker lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifetime {
    /// Stays until removed by hand.
    #[default]
    Persistent,
    /// Counts down at the end of its owner's turns. `None` while the
    /// duration field is still empty.
    Timed(Option<u32>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub id: MarkerId,
    pub label: String,
    pub lifetime: Lifetime,
}

impl Marker {
    pub fn new(kind: MarkerKind) -> Self {
        Self {
            id: MarkerId::generate(),
            label: kind.default_label().to_string(),
            lifetime: Lifetime::Persistent,
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.lifetime, Lifetime::Persistent)
    }

    pub fn duration(&self) -> Option<u32> {
        match self.lifetime {
            Lifetime::Persistent => None,
            Lifetime::Timed(d) => d,
        }
    }

    /// Setting a duration makes the marker timed; clearing it makes it
    /// persistent again.
    pub fn set_duration(&mut self, duration: Option<u32>) {
        self.lifetime = match duration {
            Some(d) => Lifetime::Timed(Some(d)),
            None => Lifetime::Persistent,
        };
    }

    pub fn toggle_persistent(&mut self) {
        self.lifetime = match self.lifetime {
            Lifetime::Persistent => Lifetime::Timed(None),
            Lifetime::Timed(_) => Lifetime::Persistent,
        };
    }
}

/// Ordered markers of one kind on one combatant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerList {
    kind: MarkerKind,
    items: Vec<Marker>,
}

impl MarkerList {
    pub fn new(kind: MarkerKind) -> Self {
        Self { kind, items: Vec::new() }
    }

    pub fn from_items(kind: MarkerKind, items: Vec<Marker>) -> Self {
        Self { kind, items }
    }

    pub fn kind(&self) -> MarkerKind {
        self.kind
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &MarkerId) -> Option<&Marker> {
        self.items.iter().find(|m| &m.id == id)
    }

    /// Appends a persistent marker with the default label and returns its id.
    pub fn add(&mut self) -> MarkerId {
        let marker = Marker::new(self.kind);
        let id = marker.id.clone();
        self.items.push(marker);
        id
    }

    pub fn push(&mut self, marker: Marker) {
        self.items.push(marker);
    }

    pub fn remove(&mut self, id: &MarkerId) -> TrackerResult<Marker> {
        let idx = self.position(id)?;
        Ok(self.items.remove(idx))
    }

    pub fn rename(&mut self, id: &MarkerId, label: impl Into<String>) -> TrackerResult<()> {
        self.get_mut(id)?.label = label.into();
        Ok(())
    }

    pub fn set_duration(&mut self, id: &MarkerId, duration: Option<u32>) -> TrackerResult<()> {
        self.get_mut(id)?.set_duration(duration);
        Ok(())
    }

    pub fn toggle_persistent(&mut self, id: &MarkerId) -> TrackerResult<()> {
        self.get_mut(id)?.toggle_persistent();
        Ok(())
    }

    /// End-of-turn countdown: every timed marker with a duration loses one,
    /// and those that reach zero are dropped. Returns the expired markers.
    pub fn decay(&mut self) -> Vec<Marker> {
        let mut expired = vec![];
        let mut kept = Vec::with_capacity(self.items.len());
        for mut m in self.items.drain(..) {
            if let Lifetime::Timed(Some(d)) = m.lifetime {
                let left = d.saturating_sub(1);
                m.lifetime = Lifetime::Timed(Some(left));
                if left == 0 {
                    expired.push(m);
                    continue;
                }
            }
            kept.push(m);
        }
        self.items = kept;
        expired
    }

    fn position(&self, id: &MarkerId) -> TrackerResult<usize> {
        self.items
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| TrackerError::UnknownMarker(id.to_string()))
    }

    fn get_mut(&mut self, id: &MarkerId) -> TrackerResult<&mut Marker> {
        let idx = self.position(id)?;
        Ok(&mut self.items[idx])
    }
}
