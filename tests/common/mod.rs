//! Shared test utilities for E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_git();
//!     fixture.command().arg("configure").arg(fixture.path()).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::files;
    #[allow(unused_imports)]
    pub use super::templates_dir;
    pub use super::TestFixture;
}

/// File contents used across tests.
#[allow(dead_code)]
pub mod files {
    /// Override document selecting the pure-python profile.
    pub const META_PURE_PYTHON: &str = r#"[meta]
template = "pure-python"
"#;

    /// Override document with a few tox tweaks.
    pub const META_WITH_TOX: &str = r#"[meta]
template = "default"

[tox]
test_runner = "pytest"
test_path = "/tests"
"#;

    /// A setup.cfg still carrying sections the generated files replace.
    pub const LEGACY_SETUP_CFG: &str = "[metadata]\nname = plone.example\n\n[flake8]\nmax-line-length = 88\n";

    /// Broken TOML.
    pub const INVALID_TOML: &str = "[tool.black\nline-length = 88\n";
}

/// The templates shipped with the crate.
#[allow(dead_code)]
pub fn templates_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}

/// A temporary directory that can be turned into a git repository.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Run `git init` in the fixture and set a local identity.
    #[allow(dead_code)]
    pub fn with_git(self) -> Self {
        self.git(&["init", "--quiet"]);
        self.git(&["config", "user.name", "Test User"]);
        self.git(&["config", "user.email", "test@example.com"]);
        self.git(&["config", "commit.gpgsign", "false"]);
        self
    }

    /// Point `origin` at `url`.
    #[allow(dead_code)]
    pub fn with_remote(self, url: &str) -> Self {
        self.git(&["remote", "add", "origin", url]);
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Create an empty directory.
    #[allow(dead_code)]
    pub fn with_dir(self, path: &str) -> Self {
        self.temp_dir
            .child(path)
            .create_dir_all()
            .expect("Failed to create directory");
        self
    }

    /// Run git in the fixture and return its stdout.
    #[allow(dead_code)]
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Read a file from the fixture.
    #[allow(dead_code)]
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command running in this fixture with the bundled templates and no
    /// colours.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("repo-meta");
        cmd.current_dir(self.path())
            .env("REPO_META_TEMPLATES", templates_dir())
            .env("NO_COLOR", "1")
            .env_remove("REPO_META_REVISION");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_file() {
        let fixture = TestFixture::new().with_file("news/.gitkeep", "");
        assert!(fixture.path().join("news/.gitkeep").exists());
    }

    #[test]
    fn test_bundled_templates_exist() {
        assert!(templates_dir().join("default").is_dir());
    }

    #[test]
    fn test_meta_documents_are_valid_toml() {
        for text in [files::META_PURE_PYTHON, files::META_WITH_TOX] {
            text.parse::<toml::Table>().expect("should be valid TOML");
        }
    }
}
