use tracker_engine::markers::MarkerKind;
use tracker_engine::{
    no_autosave, Combatant, CombatantId, CombatantType, Encounter, Resource,
};

fn encounter_of(types: &[CombatantType]) -> (Encounter, Vec<CombatantId>) {
    let mut enc = Encounter::new("Test");
    let ids = types
        .iter()
        .enumerate()
        .map(|(i, ty)| {
            let mut c = Combatant::new(CombatantId::from(format!("c{i}")), *ty)
                .with_initiative(20 - i as i32);
            c.name = format!("c{i}");
            enc.add_combatant(c).unwrap()
        })
        .collect();
    (enc, ids)
}

fn three() -> (Encounter, Vec<CombatantId>) {
    encounter_of(&[CombatantType::Pc, CombatantType::Enemy, CombatantType::Neutral])
}

#[test]
fn full_cycle_rolls_the_round_once() {
    let (mut enc, _) = three();
    let mut reports = vec![];
    for _ in 0..3 {
        reports.push(enc.next_turn(no_autosave));
    }
    assert_eq!(enc.round(), 2);
    assert_eq!(
        reports.iter().filter(|r| r.new_round).count(),
        1,
        "only the third call rolls over"
    );
    assert!(reports[2].new_round);
    for c in enc.roster().iter() {
        assert!(!c.has_acted);
        assert_eq!(c.stats.round_count, 1);
        assert_eq!(c.stats.turn_count, 1);
    }
    assert_eq!(enc.active_index(), 0);
}

#[test]
fn next_wraps_and_previous_wraps_back() {
    let (mut enc, _) = three();
    enc.change_turn(2, no_autosave);
    assert_eq!(enc.next_turn(no_autosave).active, Some(0));
    assert_eq!(enc.previous_turn(no_autosave), Some(2));
    assert_eq!(enc.previous_turn(no_autosave), Some(1));
}

#[test]
fn previous_does_not_undo_bookkeeping() {
    let (mut enc, ids) = three();
    enc.next_turn(no_autosave);
    enc.previous_turn(no_autosave);
    let first = enc.combatant(&ids[0]).unwrap();
    assert!(first.has_acted);
    assert_eq!(first.stats.turn_count, 1);

    // Already acted this round, so passing again changes nothing.
    enc.next_turn(no_autosave);
    assert_eq!(enc.combatant(&ids[0]).unwrap().stats.turn_count, 1);
    assert_eq!(enc.round(), 1);
}

#[test]
fn empty_roster_is_a_no_op() {
    let mut enc = Encounter::new("Empty");
    let report = enc.next_turn(|_, _| panic!("no autosave expected"));
    assert_eq!(report.active, None);
    assert_eq!(enc.previous_turn(no_autosave), None);
    assert_eq!(enc.round(), 1);
}

#[test]
fn single_combatant_repeats_and_rolls_each_turn() {
    let (mut enc, ids) = encounter_of(&[CombatantType::Pc]);
    enc.toggle_resource(&ids[0], Resource::Action).unwrap();
    let report = enc.next_turn(no_autosave);
    assert_eq!(report.active, Some(0));
    assert!(report.new_round);
    assert_eq!(enc.round(), 2);
    assert!(!enc.combatant(&ids[0]).unwrap().economy().unwrap().action);
}

#[test]
fn change_turn_resets_resources_and_calls_autosave() {
    let (mut enc, ids) = three();
    enc.toggle_resource(&ids[1], Resource::Action).unwrap();
    enc.toggle_resource(&ids[1], Resource::Reaction).unwrap();
    enc.set_movement(&ids[1], Some(5), None).unwrap();
    let mut saved = vec![];
    enc.change_turn(1, |round, turn| saved.push((round, turn)));
    let economy = *enc.combatant(&ids[1]).unwrap().economy().unwrap();
    assert!(!economy.action && !economy.bonus_action && !economy.reaction);
    assert_eq!(economy.current_movement, economy.max_movement);
    assert_eq!(saved, vec![(1, 2)]);
    assert_eq!(enc.turn_time(), 0);
    assert!(enc.log().last().unwrap().event.contains("c1"));
}

#[test]
fn out_of_range_change_turn_is_ignored() {
    let (mut enc, _) = three();
    enc.change_turn(7, |_, _| panic!("no autosave expected"));
    assert_eq!(enc.active_index(), 0);
}

#[test]
fn turn_time_accumulates_into_the_actor() {
    let (mut enc, ids) = three();
    enc.tick();
    assert_eq!(enc.encounter_time(), 0, "paused clock does not move");
    enc.toggle_running();
    for _ in 0..4 {
        enc.tick();
    }
    enc.next_turn(no_autosave);
    assert_eq!(enc.combatant(&ids[0]).unwrap().stats.cumulative_turn_time, 4);
    assert_eq!(enc.encounter_time(), 4);
    assert_eq!(enc.turn_time(), 0);
}

#[test]
fn timed_token_expires_after_its_owner_turn() {
    let (mut enc, ids) = three();
    let timed = enc.add_marker(&ids[0], MarkerKind::Token).unwrap();
    enc.set_marker_duration(&ids[0], MarkerKind::Token, &timed, Some(1))
        .unwrap();
    let kept = enc.add_marker(&ids[0], MarkerKind::Token).unwrap();
    let other = enc.add_marker(&ids[1], MarkerKind::Token).unwrap();
    enc.set_marker_duration(&ids[1], MarkerKind::Token, &other, Some(1))
        .unwrap();

    let report = enc.next_turn(no_autosave);
    assert_eq!(report.expired.len(), 1);
    assert_eq!(report.expired[0].id, timed);
    let tokens = &enc.combatant(&ids[0]).unwrap().tokens;
    assert!(tokens.get(&timed).is_none());
    assert!(tokens.get(&kept).is_some());
    assert_eq!(
        enc.combatant(&ids[1]).unwrap().tokens.get(&other).unwrap().duration(),
        Some(1),
        "only the actor's markers tick"
    );
}

#[test]
fn persistent_token_survives_many_rounds() {
    let (mut enc, ids) = three();
    let token = enc.add_marker(&ids[0], MarkerKind::Token).unwrap();
    let condition = enc.add_marker(&ids[0], MarkerKind::Condition).unwrap();
    enc.set_marker_duration(&ids[0], MarkerKind::Condition, &condition, Some(2))
        .unwrap();
    for _ in 0..30 {
        enc.next_turn(no_autosave);
    }
    let c = enc.combatant(&ids[0]).unwrap();
    assert!(c.tokens.get(&token).is_some());
    assert!(c.conditions.is_empty());
    assert_eq!(enc.round(), 11);
}

#[test]
fn rollover_clears_legendary_actions_of_legendary_only() {
    let (mut enc, ids) = encounter_of(&[CombatantType::Legendary, CombatantType::Enemy]);
    for id in &ids {
        enc.toggle_legendary_action(id, 0).unwrap();
        enc.toggle_legendary_resistance(id, 1).unwrap();
    }
    enc.next_turn(no_autosave);
    enc.next_turn(no_autosave);
    let boss = enc.combatant(&ids[0]).unwrap();
    let grunt = enc.combatant(&ids[1]).unwrap();
    assert_eq!(boss.legendary_actions, [false; 3]);
    assert_eq!(boss.legendary_resistances, [false, true, false]);
    assert_eq!(grunt.legendary_actions, [true, false, false]);
}

#[test]
fn environment_has_no_economy_but_takes_turns() {
    let (mut enc, ids) = encounter_of(&[CombatantType::Environment, CombatantType::Pc]);
    let lava = enc.combatant(&ids[0]).unwrap();
    assert!(lava.economy().is_none());
    assert!(!enc.toggle_resource(&ids[0], Resource::Action).unwrap());
    enc.next_turn(no_autosave);
    enc.previous_turn(no_autosave);
    assert_eq!(enc.active().unwrap().id, ids[0]);
    assert_eq!(enc.combatant(&ids[0]).unwrap().stats.turn_count, 1);
}

#[test]
fn removing_an_earlier_combatant_keeps_the_active_one() {
    let (mut enc, ids) = three();
    enc.change_turn(2, no_autosave);
    enc.remove_combatant(&ids[0]).unwrap();
    assert_eq!(enc.active().unwrap().id, ids[2]);
    enc.remove_combatant(&ids[2]).unwrap();
    assert_eq!(enc.active_index(), 0);
    enc.remove_combatant(&ids[1]).unwrap();
    assert!(enc.active().is_none());
    assert_eq!(enc.next_turn(no_autosave).active, None);
}

#[test]
fn toggle_running_logs_both_ways() {
    let mut enc = Encounter::new("Log");
    assert!(enc.toggle_running());
    assert!(!enc.toggle_running());
    let events: Vec<&str> = enc.log().iter().map(|e| e.event.as_str()).collect();
    assert_eq!(events, ["Encounter started", "Encounter paused"]);
}
