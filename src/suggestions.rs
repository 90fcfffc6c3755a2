//! # Error Suggestions
//!
//! Helpers that turn fatal conditions into messages saying what went wrong
//! and how to fix it, for the command layer.
//!
//! ```rust,ignore
//! if !root.join(".git").exists() {
//!     return Err(suggestions::not_a_repository(&root));
//! }
//! ```

use std::path::Path;

use crate::defaults::TEMPLATES_ENV;
use crate::error::Error;

/// The target directory is not a git checkout.
pub fn not_a_repository(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "{path} is not a git repository\n\n\
         hint: Pass the root directory of a git checkout\n\
         hint: Run 'git init' first for a brand new project",
        path = path.display()
    )
}

/// The requested profile has no template directory.
pub fn unknown_profile(profile: &str, available: &[String]) -> anyhow::Error {
    let candidates: Vec<&str> = available.iter().map(String::as_str).collect();
    let did_you_mean = find_similar(profile, &candidates)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();
    let listing = if available.is_empty() {
        "No profiles are installed".to_string()
    } else {
        format!("Available profiles are: {}", available.join(", "))
    };

    anyhow::anyhow!(
        "Unknown configuration type: {profile}{did_you_mean}\n\n\
         {listing}\n\
         hint: Run 'repo-meta profiles' to list them"
    )
}

/// The template root does not exist.
pub fn template_root_missing(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Template directory not found: {path}\n\n\
         hint: Use --templates to point at a template checkout\n\
         hint: Set the {TEMPLATES_ENV} environment variable",
        path = path.display()
    )
}

/// Convert a library error, spelling out the hint of configuration errors.
pub fn explain(error: Error) -> anyhow::Error {
    match error {
        Error::Configuration {
            message,
            hint: Some(hint),
        } => anyhow::anyhow!("{message}\n\nhint: {hint}"),
        Error::Configuration { message, hint: None } => anyhow::anyhow!("{message}"),
        Error::OverrideFile { path, message } => anyhow::anyhow!(
            "Cannot read {path}: {message}\n\n\
             hint: Fix the syntax error or delete the file to start over"
        ),
        other => other.into(),
    }
}

/// Closest candidate within an edit distance of 2.
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            (distance <= 2 && distance < input.len()).then_some((candidate, distance))
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }
    previous[b.len()]
}
