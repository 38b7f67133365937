use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A throwaway home directory and project directory for one test.
pub struct TestHome {
    pub home: TempDir,
    pub project: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        crate::test_log!("FIXTURE: Creating temp home and project");

        Self {
            home: TempDir::new().expect("Failed to create temp home"),
            project: TempDir::new().expect("Failed to create temp project"),
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        settings_in(self.home.path())
    }

    pub fn project_settings_path(&self) -> PathBuf {
        settings_in(self.project.path())
    }

    pub fn write_settings(&self, content: &str) {
        let path = self.settings_path();
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create .claude dir");
        fs::write(&path, content).expect("Failed to write settings");
    }

    pub fn read_settings(&self) -> Value {
        let text = fs::read_to_string(self.settings_path()).expect("Failed to read settings");
        serde_json::from_str(&text).expect("settings are not valid JSON")
    }

    /// A `chirp` command isolated to this home and project.
    pub fn chirp(&self) -> Command {
        chirp_in(self.home.path(), self.project.path())
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.chirp()
            .args(args)
            .output()
            .expect("Failed to run chirp")
    }
}

pub fn settings_in(dir: &Path) -> PathBuf {
    dir.join(".claude").join("settings.json")
}

pub fn chirp_in(home: &Path, cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_chirp"));
    cmd.current_dir(cwd)
        .env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("HOMEDRIVE")
        .env_remove("HOMEPATH")
        .env_remove("CHIRP_LOG")
        .env_remove("CHIRP_LOG_FORMAT")
        .env_remove("CHIRP_LOCK_TIMEOUT")
        .env_remove("CHIRP_EXEC_PATH");
    cmd
}
