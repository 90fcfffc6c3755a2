//! # Error Handling
//!
//! This module defines the centralized error type for `repo-meta`. It uses
//! `thiserror` to build a single `Error` enum covering every fatal failure
//! mode of a synchronization run, with a `Result<T>` alias used throughout
//! the library.
//!
//! ## Fatal versus reported conditions
//!
//! Only conditions that must stop a run (or stop a single artifact from being
//! written) are represented here:
//!
//! - Configuration errors: the target is not a repository, or no profile can
//!   be determined. These abort before anything is written.
//! - Template errors: a template is missing from every search root, or a
//!   template references a variable that was not supplied.
//! - Override file errors: the persisted override document exists but cannot
//!   be read or parsed, so it cannot be merged safely.
//! - Git command failures from the VCS collaborator.
//!
//! Everything non-fatal (validation findings, host detection ambiguity, a
//! failing verification run) is collected as a [`Warning`] instead and
//! reported at the end of the run.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Main error type for repo-meta operations
#[derive(Error, Debug)]
pub enum Error {
    /// The run cannot start: wrong target path, unknown or unset profile.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Configuration {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A template was not found in any of the search roots.
    #[error("Template not found: {name} (searched: {searched})")]
    TemplateNotFound { name: String, searched: String },

    /// A template could not be rendered.
    ///
    /// May include the name of the offending variable when applicable.
    #[error("Template rendering error in {template}: {message}{}", variable.as_ref().map(|v| format!(" (variable: {})", v)).unwrap_or_default())]
    TemplateRender {
        template: String,
        message: String,
        /// The template variable that caused the error, if applicable
        variable: Option<String>,
    },

    /// The persisted override document could not be read or parsed.
    #[error("Override file error: {path}: {message}")]
    OverrideFile { path: String, message: String },

    /// A git invocation failed.
    #[error("Git command failed: {command} - {stderr}")]
    GitCommand { command: String, stderr: String },

    /// An external tool (verification run) could not be executed.
    #[error("External tool error: {tool} - {message}")]
    ExternalTool { tool: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a [`Error::Configuration`] without a hint.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            hint: None,
        }
    }
}

/// A non-fatal finding collected during a run and printed at its end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Short category, e.g. `CI configuration` or `validation`.
    pub prefix: String,
    pub message: String,
}

impl Warning {
    pub fn new(prefix: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*** {}: {}", self.prefix, self.message)
    }
}

/// Ordered collection of warnings for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and mirror it to the log.
    pub fn warn(&mut self, prefix: impl Into<String>, message: impl Into<String>) {
        let warning = Warning::new(prefix, message);
        log::warn!("{}: {}", warning.prefix, warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}
