use tracker_engine::store::{
    export_file_name, party_file_name, write_export, EncounterStore, FileStore, MemoryStore,
};
use tracker_engine::{Combatant, CombatantType, Encounter};

fn sample() -> Encounter {
    let mut enc = Encounter::new("Dragon's Lair #2");
    enc.add_combatant(Combatant::named("Vex", CombatantType::Pc).with_hp(30))
        .unwrap();
    enc
}

#[test]
fn file_names_are_sanitized() {
    assert_eq!(export_file_name("Dragon's Lair #2"), "dragon_s_lair__2_encounter.json");
    assert_eq!(export_file_name("   "), "untitled_encounter.json");
    assert_eq!(party_file_name("Party A"), "party_a_party.json");
}

#[test]
fn file_store_starts_empty_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path().join("data"));
    assert!(store.load().unwrap().is_none());

    let enc = sample();
    store.save(&enc).unwrap();
    assert_eq!(store.load().unwrap(), Some(enc.clone()));

    let mut renamed = enc;
    renamed.name = "Later".into();
    store.save(&renamed).unwrap();
    assert_eq!(store.load().unwrap().unwrap().name, "Later");
}

#[test]
fn corrupt_store_reports_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    std::fs::write(store.path(), "][").unwrap();
    let err = store.load().unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse encounter store"));
}

#[test]
fn memory_store_holds_one_blob() {
    let mut store = MemoryStore::default();
    assert!(store.load().unwrap().is_none());
    store.save(&sample()).unwrap();
    assert!(store.blob().unwrap().contains("\"encounterName\""));
    assert_eq!(store.load().unwrap().unwrap().roster().len(), 1);
}

#[test]
fn export_writes_named_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export(dir.path(), &sample()).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "dragon_s_lair__2_encounter.json"
    );
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("Vex"));
}
