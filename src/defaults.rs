//! Default values for repo-meta.
//!
//! Process-wide constants shared by the artifact generators and the
//! orchestrator. Nothing here is mutated at runtime.

use std::path::PathBuf;

/// Name of the persisted per-repository override document.
pub const OVERRIDE_FILE: &str = ".meta.toml";

/// Name of the shared template directory every profile falls back to.
pub const SHARED_TEMPLATE_DIR: &str = "default";

/// Branch name sentinel: update whatever branch is checked out.
pub const CURRENT_BRANCH: &str = "current";

/// Suffix stripped from template names to derive the output filename.
pub const TEMPLATE_SUFFIX: &str = ".j2";

/// Origin banner prepended to every generated file. `{config_type}` is
/// replaced by the active profile.
pub const META_HINT: &str = "\
# Generated from:
# https://github.com/plone/meta/tree/main/src/plone/meta/{config_type}
# See the inline comments on how to expand/tweak this configuration file";

/// Banner variant for markdown destinations.
pub const META_HINT_MARKDOWN: &str = "\
<!--
Generated from:
https://github.com/plone/meta/tree/main/src/plone/meta/{config_type}
See the inline comments on how to expand/tweak this configuration file
-->";

pub const MXDEV_CONSTRAINTS: &str = "constraints-mxdev.txt";
pub const PLONE_CONSTRAINTS: &str = "https://dist.plone.org/release/6.0-dev/constraints.txt";

pub const DOCKER_IMAGE: &str = "python:3.11-bullseye";

pub const DEFAULT_TEST_RUNNER: &str = "zope.testrunner";

pub const GHA_DEFAULT_REF: &str = "main";
pub const GHA_DEFAULT_JOBS: &[&str] = &[
    "qa",
    "test",
    "coverage",
    "dependencies",
    "release_ready",
    "circular",
];

pub const GITLAB_DEFAULT_JOBS: &[&str] = &[
    "lint",
    "release-ready",
    "dependencies",
    "circular-dependencies",
    "testing",
    "coverage",
];

/// Files left behind by older tooling, removed on every run.
pub const OBSOLETE_FILES: &[&str] = &["bootstrap.py", ".travis.yml"];

/// `setup.cfg` sections now generated into other files.
pub const LEGACY_SETUP_CFG_SECTIONS: &[&str] = &["check-manifest", "flake8", "bdist_wheel"];

/// Dependency marker that enables the robot framework priming block.
pub const ROBOTFRAMEWORK_MARKER: &str = "plone.app.robotframework";

/// Attribution written into news entries.
pub const NEWS_ATTRIBUTION: &str = "@plone";
pub const NEWS_ATTRIBUTION_RST: &str = "[plone devs]";

pub const DEFAULT_COMMIT_MESSAGE: &str = "Configuring with plone.meta";

/// Environment variable naming the template root.
pub const TEMPLATES_ENV: &str = "REPO_META_TEMPLATES";

/// Returns the branch name used when none is given on the command line.
pub fn default_branch_name(profile: &str) -> String {
    format!(
        "config-with-{}-template-{}",
        profile,
        env!("CARGO_PKG_VERSION")
    )
}

/// Returns the template root used when neither `--templates` nor
/// `REPO_META_TEMPLATES` is set.
///
/// Prefers the `templates/` directory shipped with the crate, falling back to
/// the platform data directory (`~/.local/share/repo-meta/templates` on
/// Linux).
pub fn default_template_root() -> PathBuf {
    let bundled = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates");
    if bundled.is_dir() {
        return bundled;
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".repo-meta"))
        .join("repo-meta")
        .join("templates")
}
