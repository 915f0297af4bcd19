//! `vaultmesh forge` end to end.

use serde_json::Value;
use vaultmesh_core::strike;
use vaultmesh_types::{ArtifactIndex, ContentHash, OreId};

use crate::common::{FIXED_TIMESTAMP, ORE_TEXT, Workspace, guardians, stderr, summary_field};

const EXPECTED_ARTIFACT: &str = "artifact-4fb5e373ae387249";
const EXPECTED_ORE: &str = "ore-885ebd608e94d4ad";

fn forge(ws: &Workspace, ore: &str) -> std::process::Output {
    let base = ws.path().to_string_lossy().into_owned();
    ws.run(&["forge", ore, "--timestamp", FIXED_TIMESTAMP, "--base-dir", &base])
}

fn read_json(ws: &Workspace, name: &str) -> Value {
    serde_json::from_str(&ws.read(name)).expect("valid json")
}

fn outputs() -> [String; 4] {
    [
        format!("archive/{EXPECTED_ARTIFACT}.json"),
        format!("receipts/{EXPECTED_ARTIFACT}_receipt.json"),
        "checkpoints/checkpoint_0001.json".to_owned(),
        "artifact_index.json".to_owned(),
    ]
}

#[test]
fn forges_known_vector_with_three_signatures_in_roster_order() {
    let ws = Workspace::new();
    ws.write("ore.txt", ORE_TEXT);

    let output = forge(&ws, "ore.txt");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(summary_field(&output, "FORGED:"), EXPECTED_ARTIFACT);
    assert_eq!(summary_field(&output, "ORE:"), EXPECTED_ORE);

    let checkpoint = read_json(&ws, "checkpoints/checkpoint_0001.json");
    assert_eq!(checkpoint["height"], 1);
    assert_eq!(
        checkpoint["state_root"].as_str(),
        Some(summary_field(&output, "STATE:").as_str())
    );
    assert_eq!(
        checkpoint["archive_root"].as_str(),
        Some(summary_field(&output, "ARCH:").as_str())
    );

    let ore_id = OreId::derive(ORE_TEXT.as_bytes());
    let expected: Vec<Value> = guardians()
        .iter()
        .map(|g| Value::String(strike(&ore_id, g.id).0.as_str().to_owned()))
        .collect();
    assert_eq!(checkpoint["quorum_signatures"], Value::Array(expected));
}

#[test]
fn receipt_binds_artifact_to_quench_time() {
    let ws = Workspace::new();
    ws.write("ore.txt", ORE_TEXT);
    assert!(forge(&ws, "ore.txt").status.success());

    let receipt = read_json(&ws, &format!("receipts/{EXPECTED_ARTIFACT}_receipt.json"));
    assert_eq!(receipt["event"], "quench");
    assert_eq!(receipt["gas"], 271_828);
    assert_eq!(receipt["time"], 1_735_689_600);
    let preimage = format!("{EXPECTED_ARTIFACT}|quench|1735689600");
    assert_eq!(
        receipt["result_hash"].as_str(),
        Some(ContentHash::of(preimage.as_bytes()).as_str())
    );

    let archive = read_json(&ws, &format!("archive/{EXPECTED_ARTIFACT}.json"));
    assert_eq!(archive["receipts"][0], receipt);
}

#[test]
fn rerun_with_fixed_timestamp_is_byte_identical() {
    let ws = Workspace::new();
    ws.write("ore.txt", ORE_TEXT);

    assert!(forge(&ws, "ore.txt").status.success());
    let first: Vec<String> = outputs().iter().map(|name| ws.read(name)).collect();

    assert!(forge(&ws, "ore.txt").status.success());
    let second: Vec<String> = outputs().iter().map(|name| ws.read(name)).collect();

    assert_eq!(first, second);
}

#[test]
fn epoch_and_iso_timestamps_agree() {
    let ws = Workspace::new();
    ws.write("ore.txt", ORE_TEXT);
    let base = ws.path().to_string_lossy().into_owned();

    let iso = forge(&ws, "ore.txt");
    let epoch = ws.run(&["forge", "ore.txt", "--timestamp", "1735689600", "--base-dir", &base]);
    assert!(epoch.status.success(), "stderr: {}", stderr(&epoch));
    assert_eq!(
        summary_field(&iso, "ARCH:"),
        summary_field(&epoch, "ARCH:")
    );
}

#[test]
fn index_accumulates_distinct_artifacts() {
    let ws = Workspace::new();
    ws.write("one.txt", ORE_TEXT);
    ws.write("two.txt", "A second ore.");

    assert!(forge(&ws, "one.txt").status.success());
    assert!(forge(&ws, "two.txt").status.success());
    assert!(forge(&ws, "one.txt").status.success());

    let index: ArtifactIndex =
        serde_json::from_str(&ws.read("artifact_index.json")).expect("index");
    assert_eq!(index.len(), 2);
    assert_eq!(index.mesh, "Unforged-Forge");
    assert!(index.root_is_consistent());
    assert_eq!(index.created, 1_735_689_600);
}

#[test]
fn base_dir_from_environment() {
    let ws = Workspace::new();
    ws.write("ore.txt", ORE_TEXT);
    let ore = ws.path().join("ore.txt");

    let output = ws
        .command()
        .current_dir(std::env::temp_dir())
        .env("VAULTMESH_BASE_DIR", ws.path())
        .args(["forge", &ore.to_string_lossy(), "--timestamp", FIXED_TIMESTAMP])
        .output()
        .expect("run vaultmesh");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(ws.path().join("artifact_index.json").exists());
}

#[test]
fn missing_genesis_fails_without_writing() {
    let ws = Workspace::empty();
    ws.write("ore.txt", ORE_TEXT);

    let output = forge(&ws, "ore.txt");
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("genesis.json not found"));
    assert!(!ws.path().join("archive").exists());
    assert!(!ws.path().join("artifact_index.json").exists());
}

#[test]
fn missing_ore_is_an_input_error() {
    let ws = Workspace::new();

    let output = forge(&ws, "absent.txt");
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("error:"));
    assert!(!ws.path().join("archive").exists());
}

#[test]
fn unparseable_timestamp_is_an_input_error() {
    let ws = Workspace::new();
    ws.write("ore.txt", ORE_TEXT);
    let base = ws.path().to_string_lossy().into_owned();

    let output = ws.run(&["forge", "ore.txt", "--timestamp", "next tuesday", "--base-dir", &base]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!ws.path().join("archive").exists());
}
