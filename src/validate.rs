//! # Structural Validation
//!
//! After generation, every changed file is parsed with a parser for its own
//! format. A file that does not parse is reported as a warning and left on
//! disk for inspection; validation never fails a run.
//!
//! | Files                                    | Parser        |
//! |------------------------------------------|---------------|
//! | `*.toml`                                 | taplo + toml  |
//! | `*.yml`, `*.yaml`                        | serde_yaml    |
//! | `*.ini`, `*.cfg`, `.flake8`, `.editorconfig` | rust-ini  |
//! | `*.json`                                 | serde_json    |
//!
//! `pyproject.toml` gets a couple of extra shape checks on top of parsing.
//! Separately, [`legacy_setup_cfg_sections`] reports `setup.cfg` sections
//! that are now generated into dedicated files.

use std::fs;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use regex::Regex;

use crate::defaults::LEGACY_SETUP_CFG_SECTIONS;
use crate::error::{Diagnostics, Result};

const SETUP_CFG: &str = "setup.cfg";
const PYPROJECT: &str = "pyproject.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Yaml,
    Ini,
    Json,
}

impl Format {
    /// Pick the parser for `path` from its name, if any applies.
    pub fn for_path(path: &Path) -> Option<Format> {
        let name = path.file_name()?.to_str()?;
        if name == ".flake8" || name == ".editorconfig" {
            return Some(Format::Ini);
        }
        match path.extension()?.to_str()? {
            "toml" => Some(Format::Toml),
            "yml" | "yaml" => Some(Format::Yaml),
            "ini" | "cfg" => Some(Format::Ini),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Check every file in `changes` that still exists under `root`.
pub fn validate_changes(root: &Path, changes: &[PathBuf], diagnostics: &mut Diagnostics) {
    for relative in changes {
        let full = root.join(relative);
        if !full.is_file() {
            continue;
        }
        let Some(format) = Format::for_path(relative) else {
            log::debug!("no validator for {}", relative.display());
            continue;
        };
        let text = match fs::read_to_string(&full) {
            Ok(text) => text,
            Err(e) => {
                diagnostics.warn(relative.display().to_string(), format!("cannot read: {}", e));
                continue;
            }
        };
        let mut problems = check(format, &text);
        if format == Format::Toml && relative.file_name().is_some_and(|n| n == PYPROJECT) {
            problems.extend(check_pyproject(&text));
        }
        for problem in problems {
            diagnostics.warn(relative.display().to_string(), problem);
        }
    }
}

/// Parse `text` as `format`, returning the problems found.
pub fn check(format: Format, text: &str) -> Vec<String> {
    match format {
        Format::Toml => check_toml(text),
        Format::Yaml => serde_yaml::from_str::<serde_yaml::Value>(text)
            .err()
            .map(|e| e.to_string())
            .into_iter()
            .collect(),
        Format::Ini => {
            let options = ParseOption {
                enabled_quote: false,
                enabled_escape: false,
                enabled_indented_mutiline_value: true,
                ..ParseOption::default()
            };
            Ini::load_from_str_opt(text, options)
                .err()
                .map(|e| e.to_string())
                .into_iter()
                .collect()
        }
        Format::Json => serde_json::from_str::<serde_json::Value>(text)
            .err()
            .map(|e| e.to_string())
            .into_iter()
            .collect(),
    }
}

fn check_toml(text: &str) -> Vec<String> {
    let syntax = taplo::parser::parse(text);
    if !syntax.errors.is_empty() {
        return syntax.errors.into_iter().map(|e| e.message).collect();
    }
    // taplo accepts some documents toml rejects (duplicate keys).
    match text.parse::<toml::Table>() {
        Ok(_) => Vec::new(),
        Err(e) => vec![e.message().to_string()],
    }
}

fn check_pyproject(text: &str) -> Vec<String> {
    let Ok(document) = text.parse::<toml::Table>() else {
        return Vec::new();
    };
    let mut problems = Vec::new();
    if let Some(project) = document.get("project").and_then(|p| p.as_table()) {
        if project.get("name").is_some_and(|name| !name.is_str()) {
            problems.push("[project].name must be a string".to_string());
        }
    }
    if let Some(build) = document.get("build-system").and_then(|b| b.as_table()) {
        if build.get("requires").is_some_and(|req| !req.is_array()) {
            problems.push("[build-system].requires must be an array".to_string());
        }
    }
    problems
}

/// Warn about `setup.cfg` sections that generated files now cover.
pub fn legacy_setup_cfg_sections(root: &Path, diagnostics: &mut Diagnostics) -> Result<()> {
    let path = root.join(SETUP_CFG);
    if !path.is_file() {
        return Ok(());
    }
    let text = fs::read_to_string(&path)?;
    let header = Regex::new(r"(?m)^\s*\[([^\]]+)\]")?;
    for captures in header.captures_iter(&text) {
        let section = captures[1].trim();
        if LEGACY_SETUP_CFG_SECTIONS.contains(&section) {
            diagnostics.warn(
                SETUP_CFG,
                format!(
                    "The [{}] section is no longer needed, its configuration is generated elsewhere. Please remove it.",
                    section
                ),
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_for_path() {
        assert_eq!(Format::for_path(Path::new("pyproject.toml")), Some(Format::Toml));
        assert_eq!(
            Format::for_path(Path::new(".github/workflows/meta.yml")),
            Some(Format::Yaml)
        );
        assert_eq!(Format::for_path(Path::new(".flake8")), Some(Format::Ini));
        assert_eq!(Format::for_path(Path::new(".editorconfig")), Some(Format::Ini));
        assert_eq!(Format::for_path(Path::new("tox.ini")), Some(Format::Ini));
        assert_eq!(Format::for_path(Path::new(".gitignore")), None);
        assert_eq!(Format::for_path(Path::new("news/abc.internal")), None);
    }

    #[test]
    fn test_toml_errors() {
        assert!(check(Format::Toml, "[tool.black]\nline-length = 88\n").is_empty());
        assert!(!check(Format::Toml, "[tool.black\n").is_empty());
        assert!(!check(Format::Toml, "a = 1\na = 2\n").is_empty());
    }

    #[test]
    fn test_yaml_errors() {
        assert!(check(Format::Yaml, "jobs:\n  - qa\n").is_empty());
        assert!(!check(Format::Yaml, "jobs: [qa\n").is_empty());
    }

    #[test]
    fn test_ini_accepts_indented_values() {
        let tox = "[tox]\nenvlist =\n    py38\n    py312\n\n[testenv]\ncommands = zope-testrunner --all\n";
        assert!(check(Format::Ini, tox).is_empty());
    }

    #[test]
    fn test_editorconfig_root_key() {
        let text = "root = true\n\n[*]\nindent_style = space\n\n[*.{py,cfg}]\nindent_size = 4\n";
        assert!(check(Format::Ini, text).is_empty());
    }

    #[test]
    fn test_json_errors() {
        assert!(check(Format::Json, "{\"a\": 1}").is_empty());
        assert!(!check(Format::Json, "{\"a\": }").is_empty());
    }

    #[test]
    fn test_pyproject_shape() {
        let bad = "[project]\nname = 3\n\n[build-system]\nrequires = \"setuptools\"\n";
        assert_eq!(check_pyproject(bad).len(), 2);
        let good = "[project]\nname = \"plone.api\"\n\n[build-system]\nrequires = [\"setuptools\"]\n";
        assert!(check_pyproject(good).is_empty());
        assert!(check_pyproject("[tool.isort]\nprofile = \"plone\"\n").is_empty());
    }

    #[test]
    fn test_validate_changes_reports_per_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("pyproject.toml"), "[project]\nname = 1\n").unwrap();
        fs::write(temp.path().join(".pre-commit-config.yaml"), "repos: [\n").unwrap();
        fs::write(temp.path().join(".gitignore"), "*.pyc\n").unwrap();
        let changes = vec![
            PathBuf::from("pyproject.toml"),
            PathBuf::from(".pre-commit-config.yaml"),
            PathBuf::from(".gitignore"),
            PathBuf::from("bootstrap.py"),
        ];
        let mut diagnostics = Diagnostics::new();
        validate_changes(temp.path(), &changes, &mut diagnostics);
        let prefixes: Vec<_> = diagnostics
            .warnings()
            .iter()
            .map(|w| w.prefix.as_str())
            .collect();
        assert_eq!(prefixes, vec!["pyproject.toml", ".pre-commit-config.yaml"]);
    }

    #[test]
    fn test_legacy_setup_cfg_sections() {
        let temp = TempDir::new().unwrap();
        let mut diagnostics = Diagnostics::new();
        legacy_setup_cfg_sections(temp.path(), &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());

        fs::write(
            temp.path().join("setup.cfg"),
            "[metadata]\nname = x\n\n[flake8]\nmax-line-length = 88\n\n[bdist_wheel]\nuniversal = 0\n",
        )
        .unwrap();
        legacy_setup_cfg_sections(temp.path(), &mut diagnostics).unwrap();
        let messages: Vec<_> = diagnostics
            .warnings()
            .iter()
            .map(|w| w.message.clone())
            .collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("[flake8]"));
        assert!(messages[1].contains("[bdist_wheel]"));
    }
}
