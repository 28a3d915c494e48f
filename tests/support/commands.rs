//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// A gpass command isolated to this environment.
    ///
    /// HOME points at the temp home, GPASS_CONFIG_DIR at the temp config
    /// dir, and colors are disabled.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("gpass").expect("failed to find gpass binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("GPASS_CONFIG_DIR", self.config.path());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("GPASS_LOG");
        cmd.current_dir(self.home.path());
        cmd
    }

    /// `gpass init <repo> --key <key>`.
    pub fn init_cmd(&self) -> Output {
        self.cmd()
            .arg("init")
            .arg(self.repo.path())
            .arg("--key")
            .arg(&self.key)
            .output()
            .expect("failed to run gpass init")
    }

    /// `gpass add <name>` with the value on stdin.
    pub fn add(&self, name: &str, value: &str) -> Output {
        self.cmd()
            .args(["add", name])
            .write_stdin(value)
            .output()
            .expect("failed to run gpass add")
    }

    pub fn show(&self, name: &str) -> Output {
        self.cmd()
            .args(["show", name])
            .output()
            .expect("failed to run gpass show")
    }

    pub fn list(&self) -> Output {
        self.cmd()
            .arg("list")
            .output()
            .expect("failed to run gpass list")
    }

    pub fn list_json(&self) -> Output {
        self.cmd()
            .args(["list", "--json"])
            .output()
            .expect("failed to run gpass list --json")
    }

    pub fn rm(&self, name: &str) -> Output {
        self.cmd()
            .args(["rm", name, "--yes"])
            .output()
            .expect("failed to run gpass rm")
    }

    pub fn tag(&self, version: &str, name: &str) -> Output {
        self.cmd()
            .args(["tag", version, name])
            .output()
            .expect("failed to run gpass tag")
    }

    pub fn restore(&self, version: &str) -> Output {
        self.cmd()
            .args(["restore", version])
            .output()
            .expect("failed to run gpass restore")
    }
}
