//! # Console Output
//!
//! Human-facing output of the CLI: colour and emoji selection plus the
//! end-of-run summary. Logging goes through `log` instead; this module is
//! only for what the user is meant to read.
//!
//! Colour is decided once per process from the `--color` flag and the usual
//! environment conventions:
//! - `--color=always|never` wins outright,
//! - `NO_COLOR` (any value) disables colour,
//! - `CLICOLOR=0` disables it and `CLICOLOR_FORCE=1` forces it,
//! - `TERM=dumb` disables it,
//! - otherwise colour follows whether stdout is a capable terminal.

use std::env;

use console::style;

use crate::error::Warning;
use crate::orchestrator::{Change, SyncReport};

/// Output configuration for colours and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Build from the `--color` flag value (`always`, `never` or `auto`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        console::set_colors_enabled(use_color);
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn plain() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// `emoji_str` when colour is on, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// One line per change, e.g. `  wrote tox.ini`.
pub fn format_change(change: &Change) -> String {
    match change {
        Change::Written(path) => format!("  wrote {}", path.display()),
        Change::Removed(path) => format!("  removed {}", path.display()),
    }
}

pub fn format_warning(config: &OutputConfig, warning: &Warning) -> String {
    format!(
        "{} {}",
        emoji(config, "⚠️ ", "***"),
        style(format!("{}: {}", warning.prefix, warning.message)).yellow()
    )
}

/// Closing advice after a run, depending on whether an earlier run's branch
/// was reused.
pub fn help_tip(updating_branch: bool) -> &'static str {
    if updating_branch {
        "Updated the previously created PR."
    } else {
        "Create a PR, using the URL shown above."
    }
}

/// Lines of the end-of-run summary.
pub fn summary(config: &OutputConfig, report: &SyncReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} Configured with profile {} at revision {} on branch {}",
        emoji(config, "📦", "[OK]"),
        style(&report.profile).bold(),
        report.revision,
        style(&report.branch).cyan()
    )];
    lines.extend(report.changes.iter().map(format_change));

    if !report.warnings.is_empty() {
        lines.push(String::new());
        lines.extend(report.warnings.iter().map(|w| format_warning(config, w)));
    }
    if !report.failed.is_empty() {
        lines.push(format!(
            "{} {}",
            emoji(config, "❌", "[ERR]"),
            style(format!("Could not generate: {}", report.failed.join(", "))).red()
        ));
        return lines;
    }

    lines.push(String::new());
    lines.push("If everything went fine up to here:".to_string());
    lines.push(help_tip(report.updating_branch).to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::ChangeSet;
    use serial_test::serial;
    use std::path::PathBuf;

    fn report() -> SyncReport {
        let mut changes = ChangeSet::new();
        changes.written(".meta.toml");
        changes.removed("bootstrap.py");
        SyncReport {
            profile: "default".into(),
            revision: "feedbeef".into(),
            branch: "config-with-default-template-0.4.0".into(),
            updating_branch: false,
            changes,
            warnings: vec![Warning::new("towncrier", "no news folder")],
            failed: Vec::new(),
            committed: true,
        }
    }

    #[test]
    #[serial]
    fn test_color_flags() {
        assert!(OutputConfig::from_env_and_flag("always").use_color);
        assert!(!OutputConfig::from_env_and_flag("never").use_color);
    }

    #[test]
    fn test_emoji_without_color() {
        assert_eq!(emoji(&OutputConfig::plain(), "📦", "[OK]"), "[OK]");
    }

    #[test]
    fn test_format_change() {
        assert_eq!(
            format_change(&Change::Removed(PathBuf::from(".travis.yml"))),
            "  removed .travis.yml"
        );
    }

    #[test]
    #[serial]
    fn test_summary_plain() {
        console::set_colors_enabled(false);
        let lines = summary(&OutputConfig::plain(), &report());
        assert!(lines[0].starts_with("[OK] Configured with profile default"));
        assert!(lines.contains(&"  wrote .meta.toml".to_string()));
        assert!(lines.contains(&"*** towncrier: no news folder".to_string()));
        assert_eq!(lines.last().unwrap(), "Create a PR, using the URL shown above.");
    }

    #[test]
    #[serial]
    fn test_summary_with_failures_has_no_tip() {
        console::set_colors_enabled(false);
        let mut report = report();
        report.failed.push("flake8".into());
        let lines = summary(&OutputConfig::plain(), &report);
        assert_eq!(lines.last().unwrap(), "[ERR] Could not generate: flake8");
    }

    #[test]
    fn test_help_tip() {
        assert_eq!(help_tip(true), "Updated the previously created PR.");
    }
}
