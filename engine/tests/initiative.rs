use proptest::prelude::*;
use tracker_engine::initiative::sort_roster;
use tracker_engine::{Bounds, Combatant, CombatantId, CombatantType, Commit, EditBuffer, Encounter, Roster};

fn combatant(id: &str, initiative: Option<i32>) -> Combatant {
    let mut c = Combatant::new(CombatantId::from(id), CombatantType::Enemy);
    c.name = id.to_string();
    c.initiative = initiative;
    c
}

fn order(roster: &Roster) -> Vec<String> {
    roster.iter().map(|c| c.id.to_string()).collect()
}

#[test]
fn descending_with_unset_last() {
    let mut roster: Roster = vec![
        combatant("a", None),
        combatant("b", Some(12)),
        combatant("c", Some(-1)),
        combatant("d", None),
        combatant("e", Some(20)),
    ]
    .into_iter()
    .collect();
    sort_roster(&mut roster);
    assert_eq!(order(&roster), ["e", "b", "c", "a", "d"]);
}

#[test]
fn ties_keep_their_previous_order() {
    let mut roster: Roster = vec![
        combatant("x", Some(10)),
        combatant("y", Some(15)),
        combatant("z", Some(10)),
        combatant("w", Some(10)),
    ]
    .into_iter()
    .collect();
    sort_roster(&mut roster);
    assert_eq!(order(&roster), ["y", "x", "z", "w"]);
    sort_roster(&mut roster);
    assert_eq!(order(&roster), ["y", "x", "z", "w"]);
}

#[test]
fn rosters_in_a_different_turn_order_are_not_equal() {
    let forward: Roster = vec![combatant("a", Some(5)), combatant("b", Some(15))]
        .into_iter()
        .collect();
    let mut sorted = forward.clone();
    assert_eq!(sorted, forward);
    sort_roster(&mut sorted);
    assert_eq!(order(&sorted), ["b", "a"]);
    assert_ne!(sorted, forward);

    let backward: Roster = vec![combatant("b", Some(15)), combatant("a", Some(5))]
        .into_iter()
        .collect();
    assert_eq!(sorted, backward);
}

#[test]
fn committing_initiative_keeps_the_active_combatant() {
    let mut enc = Encounter::new("Bridge");
    for (id, init) in [("a", 18), ("b", 12), ("c", 5)] {
        enc.add_combatant(combatant(id, Some(init))).unwrap();
    }
    enc.change_turn(1, tracker_engine::no_autosave);
    enc.commit_initiative(&CombatantId::from("c"), Some(25)).unwrap();
    assert_eq!(order(enc.roster()), ["c", "a", "b"]);
    assert_eq!(enc.active().unwrap().id.as_str(), "b");
    assert_eq!(enc.active_index(), 2);
}

#[test]
fn edit_buffer_commits_only_valid_text() {
    let mut enc = Encounter::new("Typing");
    let id = enc.add_combatant(combatant("a", Some(10))).unwrap();
    let mut buf = EditBuffer::new(Bounds::INITIATIVE);

    buf.input("1");
    buf.input("15");
    assert_eq!(buf.display(Some(10)), "15");
    assert_eq!(enc.combatant(&id).unwrap().initiative, Some(10), "not yet committed");
    if let Some(commit) = buf.commit() {
        enc.commit_initiative(&id, commit.value().map(|v| v as i32)).unwrap();
    }
    assert_eq!(enc.combatant(&id).unwrap().initiative, Some(15));

    buf.input("150");
    assert_eq!(buf.commit(), None);
    assert_eq!(buf.display(Some(15)), "15", "rejected text reverts the display");

    buf.input("  ");
    assert_eq!(buf.commit(), Some(Commit::Clear));
}

fn arb_initiative() -> impl Strategy<Value = Option<i32>> {
    prop_oneof![Just(None), (-5i32..25).prop_map(Some)]
}

proptest! {
    #[test]
    fn sorting_is_idempotent_and_stable(inits in proptest::collection::vec(arb_initiative(), 0..12)) {
        let mut roster: Roster = inits
            .iter()
            .enumerate()
            .map(|(i, init)| combatant(&format!("c{i}"), *init))
            .collect();
        sort_roster(&mut roster);
        let once = order(&roster);
        sort_roster(&mut roster);
        prop_assert_eq!(&once, &order(&roster));

        let sorted: Vec<&Combatant> = roster.iter().collect();
        for pair in sorted.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            match (a.initiative, b.initiative) {
                (Some(x), Some(y)) => {
                    prop_assert!(x >= y);
                    if x == y {
                        let ia: usize = a.id.as_str()[1..].parse().unwrap();
                        let ib: usize = b.id.as_str()[1..].parse().unwrap();
                        prop_assert!(ia < ib, "tie reordered");
                    }
                }
                (None, Some(_)) => prop_assert!(false, "unset sorted before a value"),
                (None, None) => {
                    let ia: usize = a.id.as_str()[1..].parse().unwrap();
                    let ib: usize = b.id.as_str()[1..].parse().unwrap();
                    prop_assert!(ia < ib, "unset entries reordered");
                }
                (Some(_), None) => {}
            }
        }
    }
}
