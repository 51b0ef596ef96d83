//! JSON documents for encounters and party rosters.
//!
//! Field names follow the browser tracker's camelCase layout. Everything
//! except the `characters` array is optional on the way in and defaulted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::combatant::{
    ActionEconomy, Combatant, CombatantType, LEGENDARY_SLOTS, MAX_MOVEMENT, Role, TurnStats,
    DEFAULT_MOVEMENT, DEFAULT_NAME,
};
use crate::encounter::{first_round, Encounter, LogEntry, DEFAULT_ENCOUNTER_NAME};
use crate::error::{TrackerError, TrackerResult};
use crate::id::{CombatantId, MarkerId};
use crate::life::{DeathSaves, Health, LifeState, Vital, SAVE_SLOTS};
use crate::markers::{Lifetime, Marker, MarkerKind, MarkerList};
use crate::roster::Roster;

fn default_encounter_name() -> String {
    DEFAULT_ENCOUNTER_NAME.to_string()
}

fn default_combatant_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_type() -> CombatantType {
    CombatantType::Pc
}

fn default_vital() -> Vital {
    Vital::Alive
}

/// Full encounter file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterDoc {
    #[serde(default = "default_encounter_name")]
    pub encounter_name: String,
    pub characters: Vec<CombatantDoc>,
    #[serde(default = "first_round")]
    pub round: u32,
    #[serde(default)]
    pub encounter_time: u64,
    #[serde(default)]
    pub turn_time: u64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub log: Vec<LogEntry>,
    #[serde(default)]
    pub active_character_index: usize,
    #[serde(default)]
    pub is_running: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantDoc {
    #[serde(default = "CombatantId::generate")]
    pub id: CombatantId,
    #[serde(default = "default_combatant_name")]
    pub name: String,
    #[serde(
        rename = "type",
        default = "default_type",
        deserialize_with = "lenient::combatant_type"
    )]
    pub ty: CombatantType,
    #[serde(default, with = "lenient::initiative")]
    pub initiative: Option<i32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub current_hp: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub max_hp: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub ac: Option<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_u16"
    )]
    pub current_movement: Option<u16>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_u16"
    )]
    pub max_movement: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_action: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<bool>,
    #[serde(default)]
    pub tokens: Vec<MarkerDoc>,
    #[serde(default)]
    pub conditions: Vec<MarkerDoc>,
    #[serde(default, deserialize_with = "lenient::slots")]
    pub legendary_actions: [bool; LEGENDARY_SLOTS],
    #[serde(default, deserialize_with = "lenient::slots")]
    pub legendary_resistances: [bool; LEGENDARY_SLOTS],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_saves: Option<DeathSaves>,
    #[serde(default = "default_vital")]
    pub state: Vital,
    #[serde(default)]
    pub has_acted: bool,
    #[serde(default)]
    pub turn_count: u32,
    #[serde(default)]
    pub round_count: u32,
    #[serde(default)]
    pub cumulative_turn_time: u64,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerDoc {
    #[serde(default = "MarkerId::generate")]
    pub id: MarkerId,
    #[serde(default, alias = "text", alias = "name")]
    pub label: Option<String>,
    #[serde(default, alias = "tokenDuration", deserialize_with = "lenient::opt_u32")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub is_persistent: Option<bool>,
}

/// Reduced roster for carrying player characters between encounters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyDoc {
    #[serde(default = "default_encounter_name")]
    pub encounter_name: String,
    pub characters: Vec<PartyMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyMember {
    #[serde(rename = "characterName")]
    pub character_name: String,
    #[serde(rename = "characterType", deserialize_with = "lenient::combatant_type")]
    pub character_type: CombatantType,
    #[serde(
        rename = "characterMaxMovement",
        default,
        deserialize_with = "lenient::opt_u16"
    )]
    pub character_max_movement: Option<u16>,
    #[serde(rename = "characterAC", default, deserialize_with = "lenient::opt_u32")]
    pub character_ac: Option<u32>,
    #[serde(rename = "characterMaxHP", default, deserialize_with = "lenient::opt_u32")]
    pub character_max_hp: Option<u32>,
}

/// Which schema an import turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Encounter,
    Party,
}

impl From<&Marker> for MarkerDoc {
    fn from(m: &Marker) -> Self {
        Self {
            id: m.id.clone(),
            label: Some(m.label.clone()),
            duration: m.duration(),
            is_persistent: Some(m.is_persistent()),
        }
    }
}

impl MarkerDoc {
    fn into_marker(self, kind: MarkerKind) -> Marker {
        let persistent = self.is_persistent.unwrap_or(self.duration.is_none());
        Marker {
            id: self.id,
            label: self
                .label
                .unwrap_or_else(|| kind.default_label().to_string()),
            lifetime: if persistent {
                Lifetime::Persistent
            } else {
                Lifetime::Timed(self.duration)
            },
        }
    }
}

fn markers_from_docs(kind: MarkerKind, docs: Vec<MarkerDoc>) -> MarkerList {
    let mut list = MarkerList::new(kind);
    for doc in docs {
        let mut marker = doc.into_marker(kind);
        while list.get(&marker.id).is_some() {
            marker.id = MarkerId::generate();
        }
        list.push(marker);
    }
    list
}

impl From<&Combatant> for CombatantDoc {
    fn from(c: &Combatant) -> Self {
        let economy = c.economy();
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            ty: c.combatant_type(),
            initiative: c.initiative,
            current_hp: c.health.current_hp,
            max_hp: c.health.max_hp,
            ac: c.ac,
            current_movement: economy.map(|e| e.current_movement),
            max_movement: economy.map(|e| e.max_movement),
            action: economy.map(|e| e.action),
            bonus_action: economy.map(|e| e.bonus_action),
            reaction: economy.map(|e| e.reaction),
            tokens: c.tokens.iter().map(MarkerDoc::from).collect(),
            conditions: c.conditions.iter().map(MarkerDoc::from).collect(),
            legendary_actions: c.legendary_actions,
            legendary_resistances: c.legendary_resistances,
            death_saves: c.health.state.death_saves().cloned(),
            state: c.vital(),
            has_acted: c.has_acted,
            turn_count: c.stats.turn_count,
            round_count: c.stats.round_count,
            cumulative_turn_time: c.stats.cumulative_turn_time,
            notes: c.notes.clone(),
        }
    }
}

impl CombatantDoc {
    pub fn into_combatant(self) -> Combatant {
        let role = match Role::for_type(self.ty, DEFAULT_MOVEMENT) {
            Role::Environment => Role::Environment,
            Role::Creature { side, .. } => {
                let max_movement = self.max_movement.unwrap_or(DEFAULT_MOVEMENT).min(MAX_MOVEMENT);
                Role::Creature {
                    side,
                    economy: ActionEconomy {
                        action: self.action.unwrap_or(false),
                        bonus_action: self.bonus_action.unwrap_or(false),
                        reaction: self.reaction.unwrap_or(false),
                        current_movement: self
                            .current_movement
                            .unwrap_or(max_movement)
                            .min(MAX_MOVEMENT),
                        max_movement,
                    },
                }
            }
        };

        let state = match self.state {
            Vital::Alive => LifeState::Alive,
            Vital::Unconscious => LifeState::Unconscious {
                saves: self.death_saves.map(sanitize_saves).unwrap_or_default(),
            },
            Vital::Stable => LifeState::Stable,
            Vital::Dead => LifeState::Dead,
        };

        Combatant {
            id: self.id,
            name: self.name,
            role,
            initiative: self.initiative,
            health: Health {
                current_hp: self.current_hp,
                max_hp: self.max_hp,
                state,
            },
            ac: self.ac,
            tokens: markers_from_docs(MarkerKind::Token, self.tokens),
            conditions: markers_from_docs(MarkerKind::Condition, self.conditions),
            legendary_actions: self.legendary_actions,
            legendary_resistances: self.legendary_resistances,
            has_acted: self.has_acted,
            stats: TurnStats {
                turn_count: self.turn_count,
                round_count: self.round_count,
                cumulative_turn_time: self.cumulative_turn_time,
            },
            notes: self.notes,
        }
    }
}

fn sanitize_saves(mut saves: DeathSaves) -> DeathSaves {
    saves.successes.retain(|s| (1..=SAVE_SLOTS).contains(s));
    saves.failures.retain(|s| (1..=SAVE_SLOTS).contains(s));
    saves
}

impl From<&Encounter> for EncounterDoc {
    fn from(e: &Encounter) -> Self {
        Self {
            encounter_name: e.name.clone(),
            characters: e.roster.iter().map(CombatantDoc::from).collect(),
            round: e.round,
            encounter_time: e.encounter_time,
            turn_time: e.turn_time,
            notes: e.notes.clone(),
            log: e.log.clone(),
            active_character_index: e.active,
            is_running: e.is_running,
        }
    }
}

impl EncounterDoc {
    pub fn into_encounter(self) -> Encounter {
        let roster: Roster = self
            .characters
            .into_iter()
            .map(CombatantDoc::into_combatant)
            .collect();
        let active = self
            .active_character_index
            .min(roster.len().saturating_sub(1));
        Encounter {
            name: self.encounter_name,
            notes: self.notes,
            roster,
            round: self.round.max(1),
            encounter_time: self.encounter_time,
            turn_time: self.turn_time,
            is_running: self.is_running,
            active,
            log: self.log,
        }
    }
}

impl PartyMember {
    pub fn into_combatant(self) -> Combatant {
        let mut c = Combatant::named(self.character_name, self.character_type);
        if let Some(movement) = self.character_max_movement {
            c = c.with_movement(movement);
        }
        if let Some(max_hp) = self.character_max_hp {
            c = c.with_hp(max_hp);
        }
        c.ac = self.character_ac;
        c
    }
}

pub fn to_json(encounter: &Encounter) -> TrackerResult<String> {
    Ok(serde_json::to_string_pretty(&EncounterDoc::from(encounter))?)
}

/// Player characters only, in the reduced party layout.
pub fn party_to_json(encounter: &Encounter) -> TrackerResult<String> {
    let doc = PartyDoc {
        encounter_name: encounter.name.clone(),
        characters: encounter
            .roster
            .iter()
            .filter(|c| c.combatant_type() == CombatantType::Pc)
            .map(|c| PartyMember {
                character_name: c.name.clone(),
                character_type: c.combatant_type(),
                character_max_movement: c.economy().map(|e| e.max_movement),
                character_ac: c.ac,
                character_max_hp: c.health.max_hp,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// A party file is one whose every character carries `characterName` and
/// `characterType`. An empty list counts as an encounter.
pub fn document_kind(root: &Value) -> TrackerResult<DocumentKind> {
    let characters = root
        .get("characters")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("missing characters array"))?;
    let party = !characters.is_empty()
        && characters.iter().all(|c| {
            c.get("characterName").is_some() && c.get("characterType").is_some()
        });
    Ok(if party {
        DocumentKind::Party
    } else {
        DocumentKind::Encounter
    })
}

/// Parse either document layout into an encounter.
pub fn from_json(text: &str) -> TrackerResult<Encounter> {
    import(text).map(|(_, encounter)| encounter)
}

pub fn import(text: &str) -> TrackerResult<(DocumentKind, Encounter)> {
    let root: Value = serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
    let kind = document_kind(&root)?;
    let encounter = match kind {
        DocumentKind::Encounter => serde_json::from_value::<EncounterDoc>(root)
            .map_err(|e| malformed(e.to_string()))?
            .into_encounter(),
        DocumentKind::Party => {
            let doc: PartyDoc =
                serde_json::from_value(root).map_err(|e| malformed(e.to_string()))?;
            let mut encounter = Encounter::new(doc.encounter_name);
            encounter.roster = doc
                .characters
                .into_iter()
                .map(PartyMember::into_combatant)
                .collect();
            encounter
        }
    };
    debug!(
        ?kind,
        combatants = encounter.roster.len(),
        "imported encounter document"
    );
    Ok((kind, encounter))
}

/// Party members from either layout, ready to be added to another
/// encounter. Only player characters are taken.
pub fn party_members(text: &str) -> TrackerResult<Vec<Combatant>> {
    let (_, encounter) = import(text)?;
    Ok(encounter
        .roster
        .iter()
        .filter(|c| c.combatant_type() == CombatantType::Pc)
        .map(Combatant::duplicate)
        .collect())
}

fn malformed(reason: impl Into<String>) -> TrackerError {
    let reason = reason.into();
    warn!(%reason, "rejected encounter import");
    TrackerError::MalformedImport(reason)
}

/// Deserializers that accept what a form field may have stored: numbers,
/// numeric strings, empty strings and null. Anything unusable becomes
/// `None` instead of failing the whole document.
mod lenient {
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::warn;

    use super::default_type;
    use crate::combatant::{CombatantType, LEGENDARY_SLOTS};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Int(i64),
        Float(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    fn loose_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Option::<Loose>::deserialize(d)? {
            Some(Loose::Int(n)) => Some(n),
            Some(Loose::Float(f)) if f.fract() == 0.0 && f.is_finite() => Some(f as i64),
            Some(Loose::Text(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LooseType {
        Known(CombatantType),
        Other(serde::de::IgnoredAny),
    }

    /// Unknown type names fall back to the default type.
    pub fn combatant_type<'de, D: Deserializer<'de>>(d: D) -> Result<CombatantType, D::Error> {
        Ok(match Option::<LooseType>::deserialize(d)? {
            Some(LooseType::Known(ty)) => ty,
            Some(LooseType::Other(_)) => {
                warn!(fallback = ?default_type(), "unknown combatant type");
                default_type()
            }
            None => default_type(),
        })
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LooseFlag {
        Flag(bool),
        Other(serde::de::IgnoredAny),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LooseSlots {
        List(Vec<LooseFlag>),
        Other(serde::de::IgnoredAny),
    }

    /// Slot arrays of any length: short ones are padded with `false`,
    /// long ones truncated, non-boolean entries read as `false`.
    pub fn slots<'de, D: Deserializer<'de>>(d: D) -> Result<[bool; LEGENDARY_SLOTS], D::Error> {
        let mut out = [false; LEGENDARY_SLOTS];
        if let Some(LooseSlots::List(flags)) = Option::<LooseSlots>::deserialize(d)? {
            for (slot, flag) in out.iter_mut().zip(flags) {
                *slot = matches!(flag, LooseFlag::Flag(true));
            }
        }
        Ok(out)
    }

    pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(loose_int(d)?.and_then(|n| u32::try_from(n).ok()))
    }

    pub fn opt_u16<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u16>, D::Error> {
        Ok(loose_int(d)?.and_then(|n| u16::try_from(n).ok()))
    }

    /// Initiative travels as a string, empty when unset.
    pub mod initiative {
        use super::*;

        pub fn serialize<S: Serializer>(v: &Option<i32>, s: S) -> Result<S::Ok, S::Error> {
            match v {
                Some(n) => s.serialize_str(&n.to_string()),
                None => s.serialize_str(""),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
            Ok(loose_int(d)?.and_then(|n| i32::try_from(n).ok()))
        }
    }
}
