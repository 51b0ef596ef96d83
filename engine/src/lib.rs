pub mod clock;
pub mod combatant;
pub mod config;
pub mod encounter;
pub mod error;
pub mod id;
pub mod initiative;
pub mod input;
pub mod life;
pub mod markers;
pub mod persist;
pub mod roster;
pub mod session;
pub mod store;
pub mod turn;

pub use combatant::{ActionEconomy, Combatant, CombatantType, Resource, Role, Side};
pub use config::{Theme, TrackerConfig};
pub use encounter::{Encounter, LogEntry};
pub use error::{TrackerError, TrackerResult};
pub use id::{CombatantId, MarkerId};
pub use input::{Bounds, Commit, EditBuffer};
pub use life::{DeathSaveOutcome, DeathSaves, Health, LifeState, SaveKind, Vital};
pub use markers::{Lifetime, Marker, MarkerKind, MarkerList};
pub use roster::Roster;
pub use session::Session;
pub use turn::TurnReport;

/// Autosave callback that does nothing, for callers that persist elsewhere.
pub fn no_autosave(_round: u32, _turn: usize) {}
