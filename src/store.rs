//! # Persisted Override Store
//!
//! Loads and saves a repository's override document (`.meta.toml`): a
//! two-level mapping from section name to option name to value.
//!
//! ## Semantics
//!
//! - An absent file is an empty document. Asking for a missing section yields
//!   an empty table and asking for a missing option yields the caller's
//!   default; neither is an error.
//! - Every top-level entry must be a table. A file that cannot be read or
//!   parsed, or that has a non-table top-level entry, is fatal for the run.
//! - On save, sections that are empty are dropped, a header naming the active
//!   profile is written first, and strings containing line breaks are written
//!   as literal multi-line blocks so they survive a save/load cycle
//!   unchanged, leading line break included.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use toml::{Table, Value};

use crate::defaults::{META_HINT, OVERRIDE_FILE};
use crate::error::{Error, Result};

/// Section holding the synthesized keys.
pub const META_SECTION: &str = "meta";
/// Key recording the active profile.
pub const PROFILE_KEY: &str = "template";
/// Key recording the revision token of the run.
pub const REVISION_KEY: &str = "commit-id";

/// A single option value as seen by the generators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Str(String),
    List(Vec<String>),
    Bool(bool),
}

impl OptionValue {
    pub fn empty_str() -> Self {
        OptionValue::Str(String::new())
    }

    pub fn empty_list() -> Self {
        OptionValue::List(Vec::new())
    }

    /// Empty string, empty list and `false` are all falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            OptionValue::Str(s) => !s.is_empty(),
            OptionValue::List(items) => !items.is_empty(),
            OptionValue::Bool(b) => *b,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as template text. Lists join with a single space.
    pub fn to_text(&self) -> String {
        match self {
            OptionValue::Str(s) => s.clone(),
            OptionValue::List(items) => items.join(" "),
            OptionValue::Bool(b) => b.to_string(),
        }
    }

    /// Items to iterate over in a template loop.
    pub fn items(&self) -> Vec<String> {
        match self {
            OptionValue::Str(s) if s.is_empty() => Vec::new(),
            OptionValue::Str(s) => s.lines().map(str::to_string).collect(),
            OptionValue::List(items) => items.clone(),
            OptionValue::Bool(_) => Vec::new(),
        }
    }

    pub fn to_toml(&self) -> Value {
        match self {
            OptionValue::Str(s) => Value::String(s.clone()),
            OptionValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            OptionValue::Bool(b) => Value::Boolean(*b),
        }
    }
}

impl From<&Value> for OptionValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => OptionValue::Str(s.clone()),
            Value::Boolean(b) => OptionValue::Bool(*b),
            Value::Array(items) => OptionValue::List(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            other => OptionValue::Str(other.to_string()),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<&[&str]> for OptionValue {
    fn from(value: &[&str]) -> Self {
        OptionValue::List(value.iter().map(|s| s.to_string()).collect())
    }
}

/// The per-repository override document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideDocument {
    sections: Table,
}

impl OverrideDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse document text, rejecting top-level entries that are not tables.
    pub fn parse(text: &str) -> Result<Self> {
        let sections: Table = toml::from_str(text)?;
        if let Some((name, _)) = sections.iter().find(|(_, value)| !value.is_table()) {
            return Err(Error::OverrideFile {
                path: OVERRIDE_FILE.to_string(),
                message: format!("top-level entry `{}` must be a section", name),
            });
        }
        Ok(Self { sections })
    }

    /// Returns the named section, or an empty table if it is absent.
    pub fn section(&self, name: &str) -> Table {
        self.sections
            .get(name)
            .and_then(Value::as_table)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the named option, or `default` if the section or the option is
    /// absent.
    pub fn option(&self, section: &str, name: &str, default: OptionValue) -> OptionValue {
        self.sections
            .get(section)
            .and_then(Value::as_table)
            .and_then(|table| table.get(name))
            .map(OptionValue::from)
            .unwrap_or(default)
    }

    /// Like [`option`](Self::option) with the global fallback of an empty
    /// list.
    pub fn option_or_empty(&self, section: &str, name: &str) -> OptionValue {
        self.option(section, name, OptionValue::empty_list())
    }

    /// Set an option, creating the section if needed.
    pub fn set(&mut self, section: &str, name: &str, value: Value) {
        let entry = self
            .sections
            .entry(section.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        if let Value::Table(table) = entry {
            table.insert(name.to_string(), value);
        }
    }

    /// The profile recorded in the document, if any and non-empty.
    pub fn profile(&self) -> Option<String> {
        self.option(META_SECTION, PROFILE_KEY, OptionValue::empty_str())
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Section names in document order.
    pub fn section_names(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }

    /// The sections that survive saving: empty tables and empty arrays are
    /// dropped.
    pub fn pruned(&self) -> Table {
        self.sections
            .iter()
            .filter(|(_, value)| !is_empty_value(value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Serialize the pruned document with its header.
    pub fn to_toml_string(&self, profile: &str) -> String {
        let mut out = META_HINT.replace("{config_type}", profile);
        out.push('\n');

        let pruned = self.pruned();
        // `meta` leads, the rest keep table order.
        let mut names: Vec<&String> = pruned.keys().collect();
        names.sort_by_key(|name| name.as_str() != META_SECTION);

        for name in names {
            let Some(Value::Table(table)) = pruned.get(name) else {
                continue;
            };
            out.push('\n');
            out.push_str(&format!("[{}]\n", format_key(name)));
            for (key, value) in table {
                out.push_str(&format!("{} = {}\n", format_key(key), format_value(value)));
            }
        }
        out
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Table(table) => table.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn format_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        key.to_string()
    } else {
        Value::String(key.to_string()).to_string()
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format_string(s),
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_str) => {
            let mut out = String::from("[\n");
            for item in items {
                out.push_str(&format!("    {},\n", format_value(item)));
            }
            out.push(']');
            out
        }
        other => other.to_string(),
    }
}

/// Strings with line breaks become literal multi-line blocks.
///
/// A TOML parser drops the line break right after the opening `'''`, so the
/// block always starts with one; a value that itself starts with a line break
/// keeps it. Carriage returns are not kept verbatim in a literal block, so
/// values containing one are written escaped.
fn format_string(s: &str) -> String {
    let literal_safe = !s.contains("'''")
        && s
            .chars()
            .all(|c| c == '\n' || c == '\t' || !c.is_control());
    if s.contains('\n') && literal_safe {
        format!("'''\n{}'''", s)
    } else {
        Value::String(s.to_string()).to_string()
    }
}

/// Path of the override document under `root`.
pub fn path(root: &Path) -> PathBuf {
    root.join(OVERRIDE_FILE)
}

/// Load the override document of the repository at `root`.
pub fn load(root: &Path) -> Result<OverrideDocument> {
    let file = path(root);
    if !file.exists() {
        log::debug!("no {} in {}, starting empty", OVERRIDE_FILE, root.display());
        return Ok(OverrideDocument::new());
    }
    let text = fs::read_to_string(&file).map_err(|e| Error::OverrideFile {
        path: file.display().to_string(),
        message: e.to_string(),
    })?;
    OverrideDocument::parse(&text).map_err(|e| match e {
        Error::OverrideFile { message, .. } => Error::OverrideFile {
            path: file.display().to_string(),
            message,
        },
        other => Error::OverrideFile {
            path: file.display().to_string(),
            message: other.to_string(),
        },
    })
}

/// Write the pruned document to `root`, returning the written path.
pub fn save(root: &Path, document: &OverrideDocument, profile: &str) -> Result<PathBuf> {
    let file = path(root);
    fs::write(&file, document.to_toml_string(profile))?;
    log::info!("wrote {}", file.display());
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let document = load(temp.path()).unwrap();
        assert_eq!(document, OverrideDocument::new());
        assert!(document.section("tox").is_empty());
    }

    #[test]
    fn test_load_unparseable_file_fails() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(OVERRIDE_FILE), "[tox\nbroken").unwrap();
        let err = load(temp.path()).unwrap_err();
        assert!(matches!(err, Error::OverrideFile { .. }));
    }

    #[test]
    fn test_top_level_scalar_is_rejected() {
        let err = OverrideDocument::parse("stray = 1\n").unwrap_err();
        assert!(err.to_string().contains("stray"));
    }

    #[test]
    fn test_option_defaults() {
        let document = OverrideDocument::parse("[tox]\ntest_runner = \"pytest\"\n").unwrap();
        assert_eq!(
            document.option("tox", "test_runner", OptionValue::empty_str()),
            OptionValue::Str("pytest".to_string())
        );
        assert_eq!(
            document.option("tox", "test_path", OptionValue::from("x")),
            OptionValue::Str("x".to_string())
        );
        assert_eq!(
            document.option_or_empty("github", "jobs"),
            OptionValue::List(Vec::new())
        );
    }

    #[test]
    fn test_option_value_conversions() {
        let document = OverrideDocument::parse(
            "[tox]\nuse_mxdev = true\njobs = [\"a\", \"b\"]\ncount = 3\n",
        )
        .unwrap();
        assert_eq!(
            document.option_or_empty("tox", "use_mxdev"),
            OptionValue::Bool(true)
        );
        assert_eq!(
            document.option_or_empty("tox", "jobs"),
            OptionValue::List(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            document.option_or_empty("tox", "count"),
            OptionValue::Str("3".to_string())
        );
    }

    #[test]
    fn test_save_prunes_empty_sections() {
        let temp = TempDir::new().unwrap();
        let mut document = OverrideDocument::parse("[tox]\n[github]\njobs = []\n").unwrap();
        document.set(META_SECTION, PROFILE_KEY, Value::String("default".into()));
        save(temp.path(), &document, "default").unwrap();

        let text = fs::read_to_string(temp.path().join(OVERRIDE_FILE)).unwrap();
        assert!(!text.contains("[tox]"));
        assert!(text.contains("[github]"));
        assert!(text.contains("jobs = []"));
        assert!(text.starts_with("# Generated from:"));
        assert!(text.contains("/default"));
    }

    #[test]
    fn test_meta_section_written_first() {
        let mut document = OverrideDocument::parse("[aaa]\nx = \"1\"\n").unwrap();
        document.set(META_SECTION, PROFILE_KEY, Value::String("default".into()));
        let text = document.to_toml_string("default");
        let meta = text.find("[meta]").unwrap();
        let aaa = text.find("[aaa]").unwrap();
        assert!(meta < aaa);
    }

    #[test]
    fn test_multiline_string_written_as_literal_block() {
        let mut document = OverrideDocument::new();
        document.set("tox", "extra_lines", Value::String("\n[testenv:x]\nfoo = 1\n".into()));
        let text = document.to_toml_string("default");
        assert!(text.contains("extra_lines = '''\n\n[testenv:x]\nfoo = 1\n'''"));

        let reloaded = OverrideDocument::parse(&text).unwrap();
        assert_eq!(
            reloaded.option_or_empty("tox", "extra_lines"),
            OptionValue::Str("\n[testenv:x]\nfoo = 1\n".to_string())
        );
    }

    #[test]
    fn test_string_with_triple_quote_falls_back_to_escaped() {
        let mut document = OverrideDocument::new();
        document.set("x", "y", Value::String("a'''\nb".into()));
        let text = document.to_toml_string("default");
        let reloaded = OverrideDocument::parse(&text).unwrap();
        assert_eq!(
            reloaded.option_or_empty("x", "y"),
            OptionValue::Str("a'''\nb".to_string())
        );
    }

    #[test]
    fn test_quoted_keys_round_trip() {
        let mut document = OverrideDocument::new();
        document.set("pyproject", "dotted.key", Value::String("v".into()));
        let text = document.to_toml_string("default");
        assert!(text.contains("\"dotted.key\" = \"v\""));
        let reloaded = OverrideDocument::parse(&text).unwrap();
        assert_eq!(reloaded, document);
    }

    #[test]
    fn test_profile_accessor() {
        let document = OverrideDocument::parse("[meta]\ntemplate = \"default\"\n").unwrap();
        assert_eq!(document.profile(), Some("default".to_string()));
        let blank = OverrideDocument::parse("[meta]\ntemplate = \"\"\n").unwrap();
        assert_eq!(blank.profile(), None);
    }

    fn text_strategy() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[ a-z=\\[\\]\"{}%\n\r\t]{0,40}").unwrap()
    }

    #[test]
    fn test_carriage_returns_survive_save_and_load() {
        for value in ["a\rb\nc", "a\r\nb", "first\r\nsecond\r\n"] {
            let mut document = OverrideDocument::new();
            document.set("tox", "extra_lines", Value::String(value.to_string()));
            let text = document.to_toml_string("default");
            assert!(!text.contains("'''"), "{:?} written as a literal block", value);
            let reloaded = OverrideDocument::parse(&text).unwrap();
            assert_eq!(
                reloaded.option_or_empty("tox", "extra_lines"),
                OptionValue::Str(value.to_string())
            );
        }
    }

    proptest! {
        #[test]
        fn prop_multiline_strings_round_trip(value in text_strategy()) {
            let mut document = OverrideDocument::new();
            document.set("section", "value", Value::String(value.clone()));
            let reloaded = OverrideDocument::parse(&document.to_toml_string("default")).unwrap();
            prop_assert_eq!(
                reloaded.option_or_empty("section", "value"),
                OptionValue::Str(value)
            );
        }

        #[test]
        fn prop_round_trip_never_adds_empty_sections(
            names in proptest::collection::vec("[a-z]{1,8}", 0..5),
            keep in proptest::collection::vec(any::<bool>(), 5),
        ) {
            let mut document = OverrideDocument::new();
            for (i, name) in names.iter().enumerate() {
                if keep[i] {
                    document.set(name, "opt", Value::String("v".into()));
                } else {
                    document.sections.insert(name.clone(), Value::Table(Table::new()));
                }
            }
            let first = OverrideDocument::parse(&document.to_toml_string("p")).unwrap();
            for name in first.section_names() {
                prop_assert!(!first.section(&name).is_empty());
            }
            let second = OverrideDocument::parse(&first.to_toml_string("p")).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
