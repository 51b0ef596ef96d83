use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tracker(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tracker").unwrap();
    cmd.current_dir(dir.path())
        .arg("--config")
        .arg(dir.path().join("tracker.yaml"))
        .arg("--store")
        .arg(dir.path().join("store"));
    cmd
}

fn seed(dir: &TempDir) {
    tracker(dir).args(["new", "Bridge Fight"]).assert().success();
    tracker(dir)
        .args(["add", "Ogre", "--type", "enemy", "--hp", "59", "--init", "18"])
        .assert()
        .success();
    tracker(dir)
        .args(["add", "Aria", "--hp", "24", "--init", "12", "--ac", "15"])
        .assert()
        .success();
}

#[test]
fn roster_is_kept_between_invocations_in_initiative_order() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    tracker(&dir)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bridge Fight | round 1"))
        .stdout(predicate::str::is_match(r"(?s)1\. Ogre.*2\. Aria").unwrap());
}

#[test]
fn turns_advance_and_roll_the_round() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    tracker(&dir)
        .arg("next")
        .assert()
        .success()
        .stdout(predicate::str::contains("round 1: Aria"));
    tracker(&dir)
        .arg("next")
        .assert()
        .success()
        .stdout(predicate::str::contains("round 2: Ogre"));
    tracker(&dir)
        .arg("prev")
        .assert()
        .success()
        .stdout(predicate::str::contains("round 2: Aria"));
}

#[test]
fn damage_to_zero_knocks_out_and_saves_resolve() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    tracker(&dir).args(["damage", "aria", "30"]).assert().success();
    tracker(&dir)
        .arg("show")
        .assert()
        .stdout(predicate::str::contains("unconscious"));
    for slot in ["1", "2"] {
        tracker(&dir)
            .args(["save", "Aria", "failure", slot])
            .assert()
            .success();
    }
    tracker(&dir)
        .args(["save", "Aria", "failure", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dead"));
}

#[test]
fn rejected_field_text_leaves_the_store_alone() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    tracker(&dir)
        .args(["ac", "Aria", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid armor class"));
    tracker(&dir)
        .args(["init", "Aria", "-3"])
        .assert()
        .success();
    tracker(&dir)
        .arg("show")
        .assert()
        .stdout(predicate::str::contains("ac 15"))
        .stdout(predicate::str::is_match(r"(?s)Ogre.*Aria .*init  -3").unwrap());
}

#[test]
fn tokens_expire_after_their_owner_acts() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    tracker(&dir)
        .args(["token", "add", "Ogre", "--label", "Blessed", "--duration", "1"])
        .assert()
        .success();
    tracker(&dir)
        .arg("next")
        .assert()
        .success()
        .stdout(predicate::str::contains("expired: Blessed"));
}

#[test]
fn export_and_import_round_trip_through_files() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    tracker(&dir)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("bridge_fight_encounter.json"));
    tracker(&dir)
        .arg("export-party")
        .assert()
        .success()
        .stdout(predicate::str::contains("bridge_fight_party.json"));

    tracker(&dir).args(["new", "Other"]).assert().success();
    tracker(&dir)
        .args(["import", "bridge_fight_party.json", "--merge"])
        .assert()
        .success()
        .stdout(predicate::str::contains("merged 1 player characters"));

    tracker(&dir)
        .args(["import", "bridge_fight_encounter.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded encounter Bridge Fight"));
    tracker(&dir)
        .arg("show")
        .assert()
        .stdout(predicate::str::contains("Ogre"));
}

#[test]
fn import_accepts_a_byte_order_mark() {
    let dir = TempDir::new().unwrap();
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(br#"{"encounterName":"Bom","characters":[{"name":"Imp"}]}"#);
    std::fs::write(dir.path().join("bom.json"), bytes).unwrap();
    tracker(&dir)
        .args(["import", "bom.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded encounter Bom"));
}

#[test]
fn malformed_import_keeps_the_current_encounter() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    std::fs::write(dir.path().join("bad.json"), "{\"round\": 2}").unwrap();
    tracker(&dir)
        .args(["import", "bad.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to import"));
    tracker(&dir)
        .arg("show")
        .assert()
        .stdout(predicate::str::contains("Bridge Fight"));
}

#[test]
fn play_reads_commands_from_stdin_and_saves_on_quit() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    tracker(&dir)
        .arg("play")
        .write_stdin("n\nbogus\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("round 1: Aria"))
        .stdout(predicate::str::contains("n next"));
    tracker(&dir)
        .arg("show")
        .assert()
        .stdout(predicate::str::contains("> 2. Aria"));
}
