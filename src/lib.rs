//! # repo-meta
//!
//! Generates and synchronizes standard project configuration files (editor
//! settings, lint and test configuration, packaging metadata, CI workflows)
//! across many repositories from shared templates plus a small per-repository
//! override document.
//!
//! ## Quick Example
//!
//! ```
//! use repo_meta::store::OverrideDocument;
//! use repo_meta::options::{self, OptionSpec, OptionDefault};
//! use repo_meta::template::render_str;
//!
//! let document = OverrideDocument::parse("[tox]\ntest_runner = \"pytest\"\n").unwrap();
//! let context = options::collect(
//!     &document,
//!     "tox",
//!     &[OptionSpec::text("test_runner").or(OptionDefault::Text("zope.testrunner"))],
//! );
//! let rendered = render_str("tox.ini.j2", "runner = %(test_runner)s\n", &context).unwrap();
//! assert_eq!(rendered, "runner = pytest\n");
//! ```
//!
//! ## Core Concepts
//!
//! - **Override document (`store`)**: the repository's `.meta.toml`, sections
//!   of options layered on top of the profile's defaults.
//! - **Templates (`template`)**: one directory per profile, falling back to
//!   the shared `default` directory, rendered with `%(name)s` placeholders.
//! - **Options (`options`)**: per-artifact option lists with defaults.
//! - **Artifacts (`artifacts`)**: one generator per output file kind, sharing
//!   the banner and whitespace post-processing.
//! - **Run (`orchestrator`)**: profile resolution, generation, cleanup,
//!   validation and the hand-off to version control (`vcs`).

pub mod artifacts;
pub mod defaults;
pub mod error;
pub mod options;
pub mod orchestrator;
pub mod output;
pub mod store;
pub mod suggestions;
pub mod template;
pub mod tracking;
pub mod validate;
pub mod vcs;
pub mod workdir;
