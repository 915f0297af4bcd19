//! `vaultmesh governance` end to end.

use serde_json::{Value, json};
use vaultmesh_governance::Proposal;
use vaultmesh_types::ContentHash;

use crate::common::{Guardian, Workspace, guardians, stderr, stdout};

fn genesis_hash(ws: &Workspace) -> String {
    let bytes = std::fs::read(ws.genesis_path()).expect("genesis bytes");
    ContentHash::of(&bytes).as_str().to_owned()
}

fn unsigned_proposal(ws: &Workspace, changes: Value) -> Value {
    json!({
        "proposal_id": "gp-0001",
        "title": "Raise quorum",
        "base_genesis_hash": genesis_hash(ws),
        "base_genesis_version": "1.0.0",
        "changes": changes,
    })
}

fn sign(mut proposal: Value, signers: &[Guardian]) -> Value {
    let challenge = Proposal::new(proposal.clone()).challenge().to_bytes();
    let signatures: Vec<Value> = signers
        .iter()
        .map(|g| {
            json!({
                "guardian_id": g.id,
                "public_key": g.public_key_b64(),
                "signature": g.sign_b64(&challenge),
            })
        })
        .collect();
    proposal["signatures"] = Value::Array(signatures);
    proposal
}

fn quorum_change() -> Value {
    json!({"json_patch": [{"op": "replace", "path": "/consensus/quorum", "value": 3}]})
}

fn verify(ws: &Workspace, proposal: &Value) -> (std::process::Output, Value) {
    ws.write("proposal.json", &proposal.to_string());
    let output = ws.run(&[
        "governance",
        "verify",
        "--proposal",
        "proposal.json",
        "--genesis",
        "genesis.json",
    ]);
    let report = serde_json::from_str(&stdout(&output)).unwrap_or(Value::Null);
    (output, report)
}

#[test]
fn signed_proposal_is_accepted_with_all_signatures_counted() {
    let ws = Workspace::new();
    let proposal = sign(unsigned_proposal(&ws, quorum_change()), &guardians());

    let (output, report) = verify(&ws, &proposal);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(report["base_lock_ok"], true);
    assert_eq!(report["paths_ok"], true);
    assert_eq!(report["apply_ok"], true);
    assert!(report["new_genesis_hash"].is_string());
    assert_eq!(report["signatures_ok"], 3);
    assert_eq!(report["signatures_total"], 3);
    assert_eq!(report["signature_verification_supported"], true);
    assert_eq!(report["reasons"], json!([]));
}

#[test]
fn report_keys_are_in_stable_order() {
    let ws = Workspace::new();
    let (_, report) = verify(&ws, &unsigned_proposal(&ws, quorum_change()));

    let keys: Vec<&str> = report
        .as_object()
        .expect("report object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        keys,
        vec![
            "challenge_hex",
            "base_genesis_hash",
            "base_genesis_version",
            "base_lock_ok",
            "paths_ok",
            "apply_ok",
            "new_genesis_hash",
            "signatures_ok",
            "signatures_total",
            "signature_verification_supported",
            "reasons",
        ]
    );
}

#[test]
fn challenge_ignores_signatures() {
    let ws = Workspace::new();
    let unsigned = unsigned_proposal(&ws, quorum_change());
    let signed = sign(unsigned.clone(), &guardians());

    let (_, a) = verify(&ws, &unsigned);
    let (_, b) = verify(&ws, &signed);
    assert_eq!(a["challenge_hex"], b["challenge_hex"]);
    assert_eq!(a["new_genesis_hash"], b["new_genesis_hash"]);
}

#[test]
fn protected_path_is_rejected() {
    let ws = Workspace::new();
    let changes = json!({"json_patch": [{"op": "add", "path": "/archive/x", "value": 1}]});

    let (output, report) = verify(&ws, &unsigned_proposal(&ws, changes));
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(report["paths_ok"], false);
    assert_eq!(report["base_lock_ok"], true);
}

#[test]
fn stale_base_hash_is_rejected_but_still_fully_evaluated() {
    let ws = Workspace::new();
    let mut proposal = unsigned_proposal(&ws, quorum_change());
    proposal["base_genesis_hash"] = json!(ContentHash::of(b"some other genesis").as_str());

    let (output, report) = verify(&ws, &proposal);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(report["base_lock_ok"], false);
    assert_eq!(report["apply_ok"], true);
    assert!(report["new_genesis_hash"].is_string());
    assert!(stderr(&output).contains("base_genesis_hash"));
}

#[test]
fn patch_that_cannot_apply_is_rejected() {
    let ws = Workspace::new();
    let changes = json!({"json_patch": [{"op": "remove", "path": "/parameters/absent"}]});

    let (output, report) = verify(&ws, &unsigned_proposal(&ws, changes));
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(report["paths_ok"], true);
    assert_eq!(report["apply_ok"], false);
    assert_eq!(report["new_genesis_hash"], Value::Null);
}

#[test]
fn merge_patch_is_supported() {
    let ws = Workspace::new();
    let changes = json!({"merge_patch": {"parameters": {"max_ore_bytes": 2048}}});

    let (output, report) = verify(&ws, &unsigned_proposal(&ws, changes));
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(report["signatures_total"], 0);
}

#[test]
fn signatures_from_outside_the_roster_are_not_counted() {
    let ws = Workspace::new();
    let outsider = Guardian::new("val-9", 9);
    let mut signers = guardians();
    signers.truncate(1);
    signers.push(outsider);
    let proposal = sign(unsigned_proposal(&ws, quorum_change()), &signers);

    let (output, report) = verify(&ws, &proposal);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(report["signatures_ok"], 1);
    assert_eq!(report["signatures_total"], 2);
}

#[test]
fn tampered_proposal_invalidates_signatures() {
    let ws = Workspace::new();
    let mut proposal = sign(unsigned_proposal(&ws, quorum_change()), &guardians());
    proposal["title"] = json!("Raise quorum (edited)");

    let (_, report) = verify(&ws, &proposal);
    assert_eq!(report["signatures_ok"], 0);
    assert_eq!(report["signatures_total"], 3);
}

#[test]
fn invalid_proposal_json_is_an_operator_error() {
    let ws = Workspace::new();
    ws.write("proposal.json", "{ nope");

    let output = ws.run(&[
        "governance",
        "verify",
        "--proposal",
        "proposal.json",
        "--genesis",
        "genesis.json",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
}

fn template_proposal(from: &str, to: &str) -> Value {
    json!({
        "ore_type": "template_evolution.v1",
        "targets": [
            {"template_path": "templates/service.yaml", "from_version": from, "to_version": to}
        ]
    })
}

fn template_verify(ws: &Workspace, proposal: &Value) -> std::process::Output {
    ws.write("template_proposal.json", &proposal.to_string());
    ws.run(&[
        "governance",
        "template-verify",
        "--proposal",
        "template_proposal.json",
        "--repo-root",
        ".",
    ])
}

#[test]
fn template_forward_bump_passes() {
    let ws = Workspace::empty();
    ws.write("templates/service.yaml", "name: svc\nversion: \"1.2.0\"\n");

    let output = template_verify(&ws, &template_proposal("1.2.0", "1.3.0"));
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("[verify] OK"));
}

#[test]
fn template_version_mismatch_fails() {
    let ws = Workspace::empty();
    ws.write("templates/service.yaml", "version: 1.1.0\n");

    let output = template_verify(&ws, &template_proposal("1.2.0", "1.3.0"));
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("[verify] FAIL"));
    assert!(stderr(&output).contains("version mismatch"));
}

#[test]
fn template_backward_bump_fails() {
    let ws = Workspace::empty();
    ws.write("templates/service.yaml", "version: 1.2.0\n");

    let output = template_verify(&ws, &template_proposal("1.2.0", "1.2.0"));
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("to_version must be greater"));
}

#[test]
fn template_wrong_ore_type_is_malformed() {
    let ws = Workspace::empty();

    let output = template_verify(&ws, &json!({"ore_type": "other", "targets": []}));
    assert_eq!(output.status.code(), Some(2));
}
