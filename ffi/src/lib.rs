//! JNI surface for the mobile host. Every call takes encounter JSON and
//! answers with `{"ok":true,"result":…}` or `{"ok":false,"error":"…"}`.

use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;
use serde_json::{json, Value};
use tracker_engine::persist::{self, EncounterDoc};
use tracker_engine::{Encounter, TrackerResult};

const VERSION: &str = concat!("tracker-ffi ", env!("CARGO_PKG_VERSION"));

fn envelope(result: TrackerResult<Value>) -> String {
    let payload = match result {
        Ok(value) => json!({ "ok": true, "result": value }),
        Err(e) => json!({ "ok": false, "error": e.to_string() }),
    };
    payload.to_string()
}

fn to_jstring(env: &JNIEnv, text: String) -> jstring {
    match env.new_string(text) {
        Ok(s) => s.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Read the argument, run `f` on it and wrap the answer.
fn respond(
    env: &mut JNIEnv,
    json: &JString,
    f: impl FnOnce(&str) -> TrackerResult<Value>,
) -> jstring {
    let text = match env.get_string(json).map(String::from) {
        Ok(input) => envelope(f(&input)),
        Err(e) => json!({ "ok": false, "error": format!("invalid_argument: {e}") }).to_string(),
    };
    to_jstring(env, text)
}

fn encounter_value(encounter: &Encounter) -> TrackerResult<Value> {
    Ok(serde_json::to_value(EncounterDoc::from(encounter))?)
}

#[no_mangle]
pub extern "system" fn Java_com_encountertracker_Ffi_version(
    env: JNIEnv,
    _class: JClass,
) -> jstring {
    to_jstring(&env, VERSION.to_string())
}

#[no_mangle]
pub extern "system" fn Java_com_encountertracker_Ffi_normalizeEncounterJson(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    respond(&mut env, &json, normalize_internal)
}

#[no_mangle]
pub extern "system" fn Java_com_encountertracker_Ffi_nextTurnJson(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    respond(&mut env, &json, next_turn_internal)
}

#[no_mangle]
pub extern "system" fn Java_com_encountertracker_Ffi_previousTurnJson(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    respond(&mut env, &json, previous_turn_internal)
}

#[no_mangle]
pub extern "system" fn Java_com_encountertracker_Ffi_exportPartyJson(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    respond(&mut env, &json, export_party_internal)
}

// Internal functions for testing without JNI overhead

/// Import either layout and hand back the full encounter document with
/// every default filled in.
pub fn normalize_internal(input: &str) -> TrackerResult<Value> {
    let (kind, encounter) = persist::import(input)?;
    Ok(json!({
        "kind": format!("{kind:?}").to_lowercase(),
        "encounter": encounter_value(&encounter)?,
    }))
}

pub fn next_turn_internal(input: &str) -> TrackerResult<Value> {
    let mut encounter = persist::from_json(input)?;
    let mut autosave = None;
    let report = encounter.next_turn(|round, turn| autosave = Some((round, turn)));
    let expired: Vec<&str> = report.expired.iter().map(|m| m.label.as_str()).collect();
    Ok(json!({
        "encounter": encounter_value(&encounter)?,
        "active": report.active,
        "newRound": report.new_round,
        "expired": expired,
        "autosave": autosave.map(|(round, turn)| json!({ "round": round, "turn": turn })),
    }))
}

pub fn previous_turn_internal(input: &str) -> TrackerResult<Value> {
    let mut encounter = persist::from_json(input)?;
    let active = encounter.previous_turn(tracker_engine::no_autosave);
    Ok(json!({
        "encounter": encounter_value(&encounter)?,
        "active": active,
    }))
}

pub fn export_party_internal(input: &str) -> TrackerResult<Value> {
    let encounter = persist::from_json(input)?;
    Ok(serde_json::from_str(&persist::party_to_json(&encounter)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO: &str = r#"{
        "encounterName": "Ford",
        "characters": [
            {"id": "1", "name": "Aria", "type": "PC", "initiative": "15", "maxHp": 20, "currentHp": 20,
             "hasActed": true},
            {"id": "2", "name": "Wolf", "type": "Enemy", "initiative": "9",
             "tokens": [{"id": "t", "label": "Bitten", "duration": 1, "isPersistent": false}]}
        ],
        "activeCharacterIndex": 1
    }"#;

    #[test]
    fn next_turn_rolls_over_and_expires_markers() {
        let out = next_turn_internal(TWO).unwrap();
        assert_eq!(out["active"], 0);
        assert_eq!(out["newRound"], true);
        assert_eq!(out["expired"], json!(["Bitten"]));
        assert_eq!(out["encounter"]["round"], 2);
        assert_eq!(out["autosave"], json!({ "round": 2, "turn": 1 }));
    }

    #[test]
    fn previous_turn_steps_back_within_the_round() {
        let out = previous_turn_internal(TWO).unwrap();
        assert_eq!(out["active"], 0);
        assert_eq!(out["encounter"]["round"], 1);
    }

    #[test]
    fn normalize_fills_defaults() {
        let out = normalize_internal(r#"{"characters":[{"name":"Imp"}]}"#).unwrap();
        assert_eq!(out["kind"], "encounter");
        let imp = &out["encounter"]["characters"][0];
        assert_eq!(imp["state"], "alive");
        assert_eq!(imp["legendaryActions"], json!([false, false, false]));
        assert_eq!(out["encounter"]["encounterName"], "New Encounter");
    }

    #[test]
    fn party_export_drops_non_players() {
        let out = export_party_internal(TWO).unwrap();
        let names: Vec<&str> = out["characters"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["characterName"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Aria"]);
    }

    #[test]
    fn errors_are_wrapped_in_the_envelope() {
        let text = envelope(next_turn_internal("{\"oops\": true}"));
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["ok"], false);
        assert!(v["error"].as_str().unwrap().contains("characters"));

        let ok: Value = serde_json::from_str(&envelope(Ok(json!(1)))).unwrap();
        assert_eq!(ok, json!({ "ok": true, "result": 1 }));
    }
}
