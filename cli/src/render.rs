//! Plain-text views of an encounter for the terminal.

use std::fmt::Write;

use tracker_engine::markers::MarkerList;
use tracker_engine::{Combatant, CombatantType, Encounter, Theme, Vital};

const RESET: &str = "\x1b[0m";

/// ANSI colour for a hit-point readout. The palette comes from the theme the
/// caller passes in; untracked maximums get no colour.
pub fn hp_color(theme: Theme, current: Option<u32>, max: Option<u32>) -> &'static str {
    let (Some(cur), Some(max)) = (current, max) else {
        return "";
    };
    if max == 0 {
        return "";
    }
    let pct = u64::from(cur) * 100 / u64::from(max);
    match (theme, pct) {
        (Theme::Light, 51..) => "\x1b[32m",
        (Theme::Light, 26..=50) => "\x1b[33m",
        (Theme::Light, _) => "\x1b[31m",
        (Theme::Dark, 51..) => "\x1b[92m",
        (Theme::Dark, 26..=50) => "\x1b[93m",
        (Theme::Dark, _) => "\x1b[91m",
    }
}

pub fn clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn type_label(ty: CombatantType) -> &'static str {
    match ty {
        CombatantType::Pc => "PC",
        CombatantType::Enemy => "Enemy",
        CombatantType::Neutral => "Neutral",
        CombatantType::Environment => "Environment",
        CombatantType::Legendary => "Legendary",
    }
}

fn state_label(v: Vital) -> &'static str {
    match v {
        Vital::Alive => "",
        Vital::Unconscious => "unconscious",
        Vital::Stable => "stable",
        Vital::Dead => "dead",
    }
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

fn markers(list: &MarkerList) -> String {
    list.iter()
        .map(|m| match m.duration() {
            Some(d) => format!("{} ({d})", m.label),
            None => m.label.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn hp(c: &Combatant, theme: Theme) -> String {
    let text = format!("{}/{}", opt(c.health.current_hp), opt(c.health.max_hp));
    match hp_color(theme, c.health.current_hp, c.health.max_hp) {
        "" => text,
        color => format!("{color}{text}{RESET}"),
    }
}

pub fn header(enc: &Encounter) -> String {
    format!(
        "{} | round {} | {} | {}",
        enc.name,
        enc.round(),
        clock(enc.encounter_time()),
        if enc.is_running() { "running" } else { "paused" }
    )
}

/// One line per combatant, in turn order, with the active one marked.
pub fn roster(enc: &Encounter, theme: Theme) -> String {
    let active = enc.active().map(|c| c.id.clone());
    let mut out = String::new();
    for (i, c) in enc.roster().iter().enumerate() {
        let pointer = if active.as_ref() == Some(&c.id) { '>' } else { ' ' };
        let _ = write!(
            out,
            "{pointer}{:>2}. {:<20} {:<11} init {:>3}  hp {}  ac {}",
            i + 1,
            c.name,
            type_label(c.combatant_type()),
            c.initiative.map(|v| v.to_string()).unwrap_or_default(),
            hp(c, theme),
            opt(c.ac),
        );
        if let Some(e) = c.economy() {
            let used = |flag: bool, label: &'static str| if flag { "" } else { label };
            let _ = write!(
                out,
                "  move {}/{} [{}{}{}]",
                e.current_movement,
                e.max_movement,
                used(e.action, "A"),
                used(e.bonus_action, "B"),
                used(e.reaction, "R"),
            );
        }
        let state = state_label(c.vital());
        if !state.is_empty() {
            let _ = write!(out, "  {state}");
        }
        if let Some(saves) = c.health.state.death_saves() {
            let _ = write!(
                out,
                " (saves {}/{} fails)",
                saves.successes.len(),
                saves.failures.len()
            );
        }
        if c.is_legendary() {
            let left = c.legendary_actions.iter().filter(|used| !**used).count();
            let _ = write!(out, "  legendary {left}/{}", c.legendary_actions.len());
        }
        if !c.tokens.is_empty() {
            let _ = write!(out, "  tokens: {}", markers(&c.tokens));
        }
        if !c.conditions.is_empty() {
            let _ = write!(out, "  conditions: {}", markers(&c.conditions));
        }
        out.push('\n');
    }
    out
}

pub fn log(enc: &Encounter) -> String {
    enc.log()
        .iter()
        .map(|e| format!("[r{} {}] {}\n", e.round, clock(e.encounter_time), e.event))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hp_palette_depends_on_theme() {
        assert_eq!(hp_color(Theme::Light, Some(20), Some(20)), "\x1b[32m");
        assert_eq!(hp_color(Theme::Dark, Some(20), Some(20)), "\x1b[92m");
        assert_eq!(hp_color(Theme::Light, Some(5), Some(20)), "\x1b[31m");
        assert_eq!(hp_color(Theme::Dark, Some(10), Some(20)), "\x1b[93m");
        assert_eq!(hp_color(Theme::Dark, Some(3), Some(0)), "");
        assert_eq!(hp_color(Theme::Light, None, Some(10)), "");
    }

    #[test]
    fn clock_is_minutes_and_seconds() {
        assert_eq!(clock(0), "00:00");
        assert_eq!(clock(125), "02:05");
    }

    #[test]
    fn roster_marks_the_active_combatant() {
        let mut enc = Encounter::new("View");
        enc.add_combatant(Combatant::named("Aria", CombatantType::Pc).with_hp(10))
            .unwrap();
        enc.add_combatant(Combatant::named("Pit", CombatantType::Environment))
            .unwrap();
        let text = roster(&enc, Theme::Light);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("> 1. Aria"));
        assert!(lines[0].contains("[ABR]"));
        assert!(lines[1].starts_with("  2. Pit"));
        assert!(!lines[1].contains("move"));
    }
}
