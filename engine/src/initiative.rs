use std::cmp::Ordering;

use crate::combatant::Combatant;
use crate::roster::Roster;

/// Turn-order comparison: higher initiative first, unset initiative last.
/// Equal values compare equal so a stable sort keeps their order.
pub fn initiative_order(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn compare(a: &Combatant, b: &Combatant) -> Ordering {
    initiative_order(a.initiative, b.initiative)
}

pub fn sort_roster(roster: &mut Roster) {
    roster.sort_by(compare);
}

