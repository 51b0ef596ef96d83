use serde::{Deserialize, Serialize};

use crate::id::{CombatantId, MarkerId};
use crate::life::{self, DeathSaveOutcome, Health, SaveKind, Vital};
use crate::markers::{MarkerKind, MarkerList};

pub const DEFAULT_NAME: &str = "New Combatant";
pub const DEFAULT_MOVEMENT: u16 = 30;
pub const MAX_MOVEMENT: u16 = 999;
pub const LEGENDARY_SLOTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatantType {
    #[serde(rename = "PC", alias = "pc")]
    Pc,
    #[serde(alias = "enemy")]
    Enemy,
    #[serde(alias = "neutral")]
    Neutral,
    #[serde(alias = "environment")]
    Environment,
    #[serde(alias = "legendary")]
    Legendary,
}

/// Per-turn resources. `true` means used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionEconomy {
    pub action: bool,
    pub bonus_action: bool,
    pub reaction: bool,
    pub current_movement: u16,
    pub max_movement: u16,
}

impl ActionEconomy {
    pub fn new(max_movement: u16) -> Self {
        let max_movement = max_movement.min(MAX_MOVEMENT);
        Self {
            action: false,
            bonus_action: false,
            reaction: false,
            current_movement: max_movement,
            max_movement,
        }
    }

    pub fn refresh(&mut self) {
        self.action = false;
        self.bonus_action = false;
        self.reaction = false;
        self.current_movement = self.max_movement;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Pc,
    Enemy,
    Neutral,
    Legendary,
}

/// Environment hazards take turns but have no action economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Creature { side: Side, economy: ActionEconomy },
    Environment,
}

impl Role {
    pub fn for_type(ty: CombatantType, movement: u16) -> Self {
        let side = match ty {
            CombatantType::Environment => return Role::Environment,
            CombatantType::Pc => Side::Pc,
            CombatantType::Enemy => Side::Enemy,
            CombatantType::Neutral => Side::Neutral,
            CombatantType::Legendary => Side::Legendary,
        };
        Role::Creature {
            side,
            economy: ActionEconomy::new(movement),
        }
    }

    pub fn combatant_type(&self) -> CombatantType {
        match self {
            Role::Environment => CombatantType::Environment,
            Role::Creature { side, .. } => match side {
                Side::Pc => CombatantType::Pc,
                Side::Enemy => CombatantType::Enemy,
                Side::Neutral => CombatantType::Neutral,
                Side::Legendary => CombatantType::Legendary,
            },
        }
    }
}

/// Which per-turn resource to flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Action,
    BonusAction,
    Reaction,
}

/// Running totals used by the statistics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnStats {
    pub turn_count: u32,
    pub round_count: u32,
    pub cumulative_turn_time: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub role: Role,
    pub initiative: Option<i32>,
    pub health: Health,
    pub ac: Option<u32>,
    pub tokens: MarkerList,
    pub conditions: MarkerList,
    pub legendary_actions: [bool; LEGENDARY_SLOTS],
    pub legendary_resistances: [bool; LEGENDARY_SLOTS],
    pub has_acted: bool,
    pub stats: TurnStats,
    pub notes: String,
}

impl Combatant {
    pub fn new(id: CombatantId, ty: CombatantType) -> Self {
        Self {
            id,
            name: DEFAULT_NAME.to_string(),
            role: Role::for_type(ty, DEFAULT_MOVEMENT),
            initiative: None,
            health: Health::default(),
            ac: None,
            tokens: MarkerList::new(MarkerKind::Token),
            conditions: MarkerList::new(MarkerKind::Condition),
            legendary_actions: [false; LEGENDARY_SLOTS],
            legendary_resistances: [false; LEGENDARY_SLOTS],
            has_acted: false,
            stats: TurnStats::default(),
            notes: String::new(),
        }
    }

    pub fn named(name: impl Into<String>, ty: CombatantType) -> Self {
        let mut c = Self::new(CombatantId::generate(), ty);
        c.name = name.into();
        c
    }

    pub fn with_hp(mut self, max_hp: u32) -> Self {
        self.health = Health::new(max_hp);
        self
    }

    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = Some(initiative);
        self
    }

    pub fn with_movement(mut self, movement: u16) -> Self {
        if let Role::Creature { economy, .. } = &mut self.role {
            *economy = ActionEconomy::new(movement);
        }
        self
    }

    pub fn combatant_type(&self) -> CombatantType {
        self.role.combatant_type()
    }

    pub fn is_legendary(&self) -> bool {
        self.combatant_type() == CombatantType::Legendary
    }

    pub fn vital(&self) -> Vital {
        self.health.state.vital()
    }

    pub fn economy(&self) -> Option<&ActionEconomy> {
        match &self.role {
            Role::Creature { economy, .. } => Some(economy),
            Role::Environment => None,
        }
    }

    pub fn economy_mut(&mut self) -> Option<&mut ActionEconomy> {
        match &mut self.role {
            Role::Creature { economy, .. } => Some(economy),
            Role::Environment => None,
        }
    }

    /// Changing type keeps the existing economy between creature sides and
    /// drops it for the environment.
    pub fn set_type(&mut self, ty: CombatantType) {
        let movement = self.economy().map_or(DEFAULT_MOVEMENT, |e| e.max_movement);
        let kept = self.economy().copied();
        self.role = Role::for_type(ty, movement);
        if let (Some(prev), Some(economy)) = (kept, self.economy_mut()) {
            *economy = prev;
        }
    }

    pub fn markers(&self, kind: MarkerKind) -> &MarkerList {
        match kind {
            MarkerKind::Token => &self.tokens,
            MarkerKind::Condition => &self.conditions,
        }
    }

    pub fn markers_mut(&mut self, kind: MarkerKind) -> &mut MarkerList {
        match kind {
            MarkerKind::Token => &mut self.tokens,
            MarkerKind::Condition => &mut self.conditions,
        }
    }

    pub fn set_current_hp(&mut self, hp: Option<u32>, log: impl FnMut(String)) -> bool {
        life::set_current_hp(&self.name, &mut self.health, hp, log)
    }

    pub fn set_max_hp(&mut self, max_hp: Option<u32>) {
        self.health.max_hp = max_hp;
    }

    pub fn set_state(&mut self, target: Vital, log: impl FnMut(String)) {
        life::set_state(&self.name, &mut self.health, target, log)
    }

    pub fn apply_damage(&mut self, amount: u32, log: impl FnMut(String)) -> bool {
        life::apply_damage(&self.name, &mut self.health, amount, log)
    }

    pub fn heal(&mut self, amount: u32, log: impl FnMut(String)) -> bool {
        life::heal(&self.name, &mut self.health, amount, log)
    }

    pub fn toggle_death_save(
        &mut self,
        kind: SaveKind,
        slot: u8,
        log: impl FnMut(String),
    ) -> DeathSaveOutcome {
        life::toggle_death_save(&self.name, &mut self.health, kind, slot, log)
    }

    /// Returns false for environment combatants, which have no resources.
    pub fn toggle_resource(&mut self, resource: Resource) -> bool {
        let Some(e) = self.economy_mut() else {
            return false;
        };
        let flag = match resource {
            Resource::Action => &mut e.action,
            Resource::BonusAction => &mut e.bonus_action,
            Resource::Reaction => &mut e.reaction,
        };
        *flag = !*flag;
        true
    }

    pub fn set_movement(&mut self, current: Option<u16>, max: Option<u16>) -> bool {
        let Some(e) = self.economy_mut() else {
            return false;
        };
        if let Some(max) = max {
            e.max_movement = max.min(MAX_MOVEMENT);
        }
        if let Some(current) = current {
            e.current_movement = current.min(MAX_MOVEMENT);
        }
        true
    }

    pub fn toggle_legendary_action(&mut self, slot: usize) {
        if let Some(s) = self.legendary_actions.get_mut(slot) {
            *s = !*s;
        }
    }

    pub fn toggle_legendary_resistance(&mut self, slot: usize) {
        if let Some(s) = self.legendary_resistances.get_mut(slot) {
            *s = !*s;
        }
    }

    /// Start-of-own-turn reset.
    pub fn begin_turn(&mut self) {
        if let Some(e) = self.economy_mut() {
            e.refresh();
        }
    }

    /// Copy with fresh ids and cleared per-encounter bookkeeping.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = CombatantId::generate();
        copy.has_acted = false;
        copy.stats = TurnStats::default();
        for kind in [MarkerKind::Token, MarkerKind::Condition] {
            let fresh = copy
                .markers(kind)
                .iter()
                .cloned()
                .map(|mut m| {
                    m.id = MarkerId::generate();
                    m
                })
                .collect();
            *copy.markers_mut(kind) = MarkerList::from_items(kind, fresh);
        }
        copy
    }
}
