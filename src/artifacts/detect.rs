//! Repository probes used to fill in artifact options.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Changelog file whose presence selects markdown news fragments.
pub const MARKDOWN_CHANGELOG: &str = "CHANGES.md";
/// Directory holding news fragments.
pub const NEWS_DIR: &str = "news";

/// Files that declare dependencies, scanned for marker strings.
const DEPENDENCY_FILES: &[&str] = &["setup.py", "setup.cfg", "pyproject.toml"];
const REQUIREMENTS_GLOB: &str = "requirements*.txt";

/// `md` when the repository keeps a markdown changelog, `rst` otherwise.
pub fn changes_extension(root: &Path) -> &'static str {
    if root.join(MARKDOWN_CHANGELOG).exists() {
        "md"
    } else {
        "rst"
    }
}

/// The news fragment directory, if the repository has one.
pub fn news_dir(root: &Path) -> Option<PathBuf> {
    let news = root.join(NEWS_DIR);
    news.is_dir().then_some(news)
}

/// Test source path relative to the repository root: `/tests`, else `/src`,
/// else empty.
pub fn test_path(root: &Path) -> String {
    for candidate in ["tests", "src"] {
        if root.join(candidate).exists() {
            return format!("/{}", candidate);
        }
    }
    String::new()
}

/// Whether any dependency-declaring file mentions `marker`.
///
/// Best effort: only files in the repository are scanned, so a dependency
/// pulled in transitively is not seen. Files are read lossily and unreadable
/// ones are skipped.
pub fn declares_dependency(root: &Path, marker: &str) -> Result<bool> {
    let mut candidates: Vec<PathBuf> = DEPENDENCY_FILES.iter().map(|f| root.join(f)).collect();
    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        REQUIREMENTS_GLOB
    );
    candidates.extend(glob::glob(&pattern)?.flatten());

    for file in candidates.iter().filter(|f| f.is_file()) {
        let bytes = match fs::read(file) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!("skipping {}: {}", file.display(), e);
                continue;
            }
        };
        if String::from_utf8_lossy(&bytes).contains(marker) {
            log::debug!("found `{}` in {}", marker, file.display());
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_changes_extension() {
        let temp = TempDir::new().unwrap();
        assert_eq!(changes_extension(temp.path()), "rst");
        fs::write(temp.path().join("CHANGES.md"), "# Changelog\n").unwrap();
        assert_eq!(changes_extension(temp.path()), "md");
    }

    #[test]
    fn test_news_dir() {
        let temp = TempDir::new().unwrap();
        assert_eq!(news_dir(temp.path()), None);
        fs::create_dir(temp.path().join("news")).unwrap();
        assert_eq!(news_dir(temp.path()), Some(temp.path().join("news")));
    }

    #[test]
    fn test_test_path_prefers_tests_over_src() {
        let temp = TempDir::new().unwrap();
        assert_eq!(test_path(temp.path()), "");
        fs::create_dir(temp.path().join("src")).unwrap();
        assert_eq!(test_path(temp.path()), "/src");
        fs::create_dir(temp.path().join("tests")).unwrap();
        assert_eq!(test_path(temp.path()), "/tests");
    }

    #[test]
    fn test_declares_dependency_in_setup_py() {
        let temp = TempDir::new().unwrap();
        assert!(!declares_dependency(temp.path(), "plone.app.robotframework").unwrap());
        fs::write(
            temp.path().join("setup.py"),
            "extras_require={'test': ['plone.app.robotframework']}",
        )
        .unwrap();
        assert!(declares_dependency(temp.path(), "plone.app.robotframework").unwrap());
    }

    #[test]
    fn test_declares_dependency_in_requirements_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("requirements-test.txt"), "plone.app.robotframework\n")
            .unwrap();
        assert!(declares_dependency(temp.path(), "plone.app.robotframework").unwrap());
    }

    #[test]
    fn test_declares_dependency_reads_non_utf8_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("setup.py"), b"author='J\xf6rg'\n").unwrap();
        assert!(!declares_dependency(temp.path(), "plone.app.robotframework").unwrap());

        fs::write(
            temp.path().join("setup.py"),
            b"author='J\xf6rg'\ninstall_requires=['plone.app.robotframework']\n",
        )
        .unwrap();
        assert!(declares_dependency(temp.path(), "plone.app.robotframework").unwrap());
    }

    #[test]
    fn test_declares_dependency_ignores_other_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("README.md"), "plone.app.robotframework").unwrap();
        assert!(!declares_dependency(temp.path(), "plone.app.robotframework").unwrap());
    }
}
