//! Shared post-processing applied to every rendered artifact before it is
//! written: destination naming, origin banner, whitespace normalization.

use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults::{META_HINT, META_HINT_MARKDOWN, TEMPLATE_SUFFIX};
use crate::error::{Error, Result};

use super::RenderedArtifact;

/// Interpreter directive marker; such a first line must stay first.
const SHEBANG: &str = "#!";

/// On-disk name for a template: the name minus its rendering suffix.
pub fn destination_for(template: &str) -> PathBuf {
    PathBuf::from(template.strip_suffix(TEMPLATE_SUFFIX).unwrap_or(template))
}

/// Origin banner for `destination`, naming the active profile.
pub fn banner(profile: &str, destination: &Path) -> String {
    let is_markdown = destination
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
    let hint = if is_markdown {
        META_HINT_MARKDOWN
    } else {
        META_HINT
    };
    hint.replace("{config_type}", profile)
}

/// Insert `banner` as the first line, or as the second when the body opens
/// with an interpreter directive.
pub fn with_banner(rendered: &str, banner: &str) -> String {
    if rendered.starts_with(SHEBANG) {
        let (directive, body) = rendered.split_once('\n').unwrap_or((rendered, ""));
        format!("{}\n{}\n{}", directive, banner, body)
    } else {
        format!("{}\n{}", banner, rendered)
    }
}

/// Blank out whitespace-only lines, drop trailing blank lines and end with
/// exactly one line break.
pub fn normalize(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 1);
    for line in content.lines() {
        if !line.trim().is_empty() {
            out.push_str(line);
        }
        out.push('\n');
    }
    let trimmed = out.trim_end_matches(['\n', '\r']).len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

/// Banner plus normalization.
pub fn finish(rendered: &str, banner: &str) -> String {
    normalize(&with_banner(rendered, banner))
}

/// Write an artifact under `root`, creating parent directories, and return
/// its path relative to `root`.
pub fn write(root: &Path, artifact: &RenderedArtifact) -> Result<PathBuf> {
    let full_path = root.join(&artifact.path);

    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create directory '{}': {}", parent.display(), e),
            ))
        })?;
    }

    fs::write(&full_path, &artifact.content).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write file '{}': {}", full_path.display(), e),
        ))
    })?;

    log::info!("wrote {}", artifact.path.display());
    Ok(artifact.path.clone())
}
