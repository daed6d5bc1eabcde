#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Container runtime stand-in that is guaranteed not to exist, so tests never
/// touch a real docker daemon.
pub const MISSING_RUNTIME: &str = "gwfleet-test-no-such-runtime";

pub struct TestContext {
    pub cmd: Command,
    pub home: PathBuf,
    // Removed when the test finishes
    _temp: TempDir,
}

impl TestContext {
    /// Fresh command sharing this context's home dir
    pub fn new_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_gwfleet");
        let mut cmd = Command::new(bin_path);
        cmd.timeout(Duration::from_secs(30));
        cmd.env_remove("GWFLEET_HOME");
        cmd.env("GWFLEET_IMAGE", "gwfleet-test:latest");
        cmd.env("GWFLEET_COMPOSE", MISSING_RUNTIME);
        cmd.arg("--home").arg(&self.home);
        cmd
    }

    pub fn create(&self, name: &str) {
        self.new_cmd().args(["create", name]).assert().success();
    }

    pub fn registry(&self) -> serde_json::Value {
        let raw = std::fs::read_to_string(self.home.join("registry.json"))
            .expect("Failed to read registry");
        serde_json::from_str(&raw).expect("Registry is not valid JSON")
    }

    pub fn instance_dir(&self, name: &str) -> PathBuf {
        self.home.join("instances").join(name)
    }
}

pub fn gwfleet() -> TestContext {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let home = temp.path().join("home");

    let mut ctx = TestContext {
        cmd: Command::new(env!("CARGO_BIN_EXE_gwfleet")),
        home,
        _temp: temp,
    };
    ctx.cmd = ctx.new_cmd();
    ctx
}
