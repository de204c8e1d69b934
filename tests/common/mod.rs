//! Common test utilities for novelist integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch
//! the user's `~/.novelist/` or `~/Documents/Novelist/` directories.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with isolated storage.
///
/// Each `TestEnv` creates three temporary directories:
/// - `data_dir`: settings and aggregate documents (via `NOVELIST_DATA_DIR`)
/// - `projects_dir`: one folder per project (via `NOVELIST_PROJECTS_DIR`)
/// - `config_dir`: holds the config.kdl named by `NOVELIST_CONFIG`
///
/// The `novelist()` method sets these per-invocation, making tests
/// parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
    pub projects_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
            projects_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a test environment with a directory-backend project.
    pub fn with_project(name: &str) -> Self {
        let env = Self::new();
        env.novelist()
            .args(["project", "create", name])
            .assert()
            .success();
        env
    }

    /// Get a Command for the novelist binary with isolated directories.
    pub fn novelist(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_novelist"));
        cmd.current_dir(self.data_dir.path());
        cmd.env("NOVELIST_DATA_DIR", self.data_dir.path());
        cmd.env("NOVELIST_PROJECTS_DIR", self.projects_dir.path());
        cmd.env("NOVELIST_CONFIG", self.config_path());
        cmd.env_remove("NOVELIST_PROJECT");
        cmd.env_remove("NOVELIST_BACKEND");
        cmd.env_remove("NOVELIST_LOG");
        cmd
    }

    /// Get a Command for the novelist binary bound to a project.
    pub fn in_project(&self, project: &str) -> Command {
        let mut cmd = self.novelist();
        cmd.env("NOVELIST_PROJECT", project);
        cmd
    }

    /// Get a Command for the novelist binary using the aggregate backend.
    pub fn aggregate(&self) -> Command {
        let mut cmd = self.novelist();
        cmd.env("NOVELIST_BACKEND", "aggregate");
        cmd
    }

    /// Write config.kdl for this environment.
    pub fn write_config(&self, kdl: &str) {
        std::fs::write(self.config_path(), kdl).unwrap();
    }

    /// Path of this environment's config.kdl (may not exist).
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.path().join("config.kdl")
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &Path {
        self.data_dir.path()
    }

    /// Get the path to the projects directory.
    pub fn projects_path(&self) -> &Path {
        self.projects_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
