//! # CLI Command Implementations
//!
//! One file per subcommand. Each defines a clap `Args` struct and an
//! `execute` function that maps the arguments onto the `repo_meta` library
//! and prints the result.

pub mod completions;
pub mod configure;
pub mod profiles;
pub mod validate;

use std::path::PathBuf;

use repo_meta::defaults::default_template_root;

/// Template root from `--templates`/`REPO_META_TEMPLATES`, else the default.
pub(crate) fn template_root(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(default_template_root)
}
