//! Package tracking: each profile keeps a `packages.txt` listing the
//! repositories configured with it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const PACKAGES_FILE: &str = "packages.txt";

/// Append `package` to the tracking list in `profile_dir`, unless it is
/// already listed. Returns the list path when it changed.
pub fn track(profile_dir: &Path, package: &str) -> Result<Option<PathBuf>> {
    let package = package.trim();
    if package.is_empty() {
        return Err(Error::configuration("cannot track a package without a name"));
    }
    let path = profile_dir.join(PACKAGES_FILE);
    let mut content = if path.exists() {
        fs::read_to_string(&path)?
    } else {
        String::new()
    };
    if content.lines().any(|line| line.trim() == package) {
        log::debug!("{} already tracked in {}", package, path.display());
        return Ok(None);
    }
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(package);
    content.push('\n');
    fs::write(&path, content)?;
    log::info!("tracking {} in {}", package, path.display());
    Ok(Some(path))
}

/// Packages currently tracked for a profile.
pub fn tracked(profile_dir: &Path) -> Result<Vec<String>> {
    let path = profile_dir.join(PACKAGES_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_track_appends_once() {
        let temp = TempDir::new().unwrap();
        assert!(track(temp.path(), "plone.api").unwrap().is_some());
        assert!(track(temp.path(), "plone.api").unwrap().is_none());
        assert!(track(temp.path(), "plone.restapi").unwrap().is_some());
        assert_eq!(tracked(temp.path()).unwrap(), vec!["plone.api", "plone.restapi"]);
    }

    #[test]
    fn test_track_fixes_missing_final_newline() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PACKAGES_FILE), "plone.api").unwrap();
        track(temp.path(), "plone.volto").unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join(PACKAGES_FILE)).unwrap(),
            "plone.api\nplone.volto\n"
        );
    }

    #[test]
    fn test_track_rejects_empty_name() {
        let temp = TempDir::new().unwrap();
        assert!(track(temp.path(), "  ").is_err());
    }
}
