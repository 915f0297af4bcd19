//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::SigningKey;
use tempfile::TempDir;

pub const ORE_TEXT: &str = "Forging under test harness.";
pub const FIXED_TIMESTAMP: &str = "2025-01-01T00:00:00Z";

/// A guardian with a deterministic ed25519 key.
pub struct Guardian {
    pub id: &'static str,
    pub key: SigningKey,
}

impl Guardian {
    pub fn new(id: &'static str, seed: u8) -> Self {
        Self {
            id,
            key: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    pub fn public_key_b64(&self) -> String {
        STANDARD.encode(self.key.verifying_key().as_bytes())
    }

    pub fn sign_b64(&self, message: &[u8]) -> String {
        use ed25519_dalek::Signer;
        STANDARD.encode(self.key.sign(message).to_bytes())
    }
}

pub fn guardians() -> Vec<Guardian> {
    vec![
        Guardian::new("val-1", 1),
        Guardian::new("val-2", 2),
        Guardian::new("val-3", 3),
    ]
}

/// A scratch forge root with a three-validator genesis.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = Self { dir };
        workspace.write_genesis(&genesis_text(&guardians()));
        workspace
    }

    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.path().join("genesis.json")
    }

    pub fn write_genesis(&self, text: &str) {
        fs::write(self.genesis_path(), text).expect("write genesis");
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).expect("read file")
    }

    /// A `vaultmesh` command that ignores any config file on this machine.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_vaultmesh"));
        cmd.current_dir(self.path())
            .env("VAULTMESH_CONFIG", self.path().join("no-such-config.toml"))
            .env_remove("VAULTMESH_BASE_DIR")
            .env_remove("VAULTMESH_LEDGER_ROOT")
            .env_remove("VAULTMESH_LEDGER_COMPACT")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("run vaultmesh")
    }

    pub fn run_with_stdin(&self, args: &[&str], stdin: &str, envs: &[(&str, &str)]) -> Output {
        let mut child = self
            .command()
            .args(args)
            .envs(envs.iter().copied())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn vaultmesh");
        child
            .stdin
            .take()
            .expect("stdin")
            .write_all(stdin.as_bytes())
            .expect("write stdin");
        child.wait_with_output().expect("wait vaultmesh")
    }
}

pub fn genesis_text(guardians: &[Guardian]) -> String {
    let validators: Vec<serde_json::Value> = guardians
        .iter()
        .map(|g| serde_json::json!({"id": g.id, "pubkey": g.public_key_b64()}))
        .collect();
    let genesis = serde_json::json!({
        "version": "1.0.0",
        "mesh": "Unforged-Forge",
        "genesis_time": "2025-01-01T00:00:00Z",
        "consensus": {"validators": validators, "quorum": 2},
        "parameters": {"max_ore_bytes": 1_048_576}
    });
    serde_json::to_string_pretty(&genesis).expect("serialize genesis")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Value printed after `label` in the forge summary.
pub fn summary_field(output: &Output, label: &str) -> String {
    stdout(output)
        .lines()
        .find_map(|line| line.strip_prefix(label))
        .map(|value| value.trim().to_owned())
        .unwrap_or_else(|| panic!("no {label} line in {}", stdout(output)))
}
