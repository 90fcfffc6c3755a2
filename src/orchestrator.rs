//! # Synchronization Run
//!
//! [`SyncOrchestrator`] drives one run against one repository:
//!
//! 1. **Init → ProfileResolved**: load the override document and pick the
//!    profile (document first, then the caller's choice).
//! 2. **→ Generated**: run every artifact generator in declared order and
//!    collect the written paths.
//! 3. **→ Cleaned**: remove obsolete files and rewrite the override document.
//! 4. **→ Validated**: optional local verification run, branch selection,
//!    then structural validation of every changed file.
//! 5. **→ Committed → Done**: stage, commit and optionally push.
//!
//! Configuration problems abort before anything is written. Problems with a
//! single artifact, validation findings and a failing verification run are
//! collected as warnings and returned in the [`SyncReport`]. Nothing is
//! rolled back: the run can simply be repeated.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::artifacts::{ArtifactKind, Generator};
use crate::defaults::{
    default_branch_name, CURRENT_BRANCH, DEFAULT_COMMIT_MESSAGE, OBSOLETE_FILES, OVERRIDE_FILE,
};
use crate::error::{Diagnostics, Error, Result, Warning};
use crate::store::{self, META_SECTION, PROFILE_KEY, REVISION_KEY};
use crate::template::TemplateResolver;
use crate::tracking;
use crate::validate;
use crate::vcs::{self, GitCli, HostFlags, Vcs};
use crate::workdir;

const CI_PREFIX: &str = "CI configuration";
const NO_CI_HOST: &str =
    "The repository is not hosted in github nor in gitlab, no CI configuration will be done!";

/// Local verification tool and the environments it runs.
const VERIFY_TOOL: &str = "tox";
const VERIFY_ARGS: &[&str] = &["-e", "format,lint"];

/// Caller-supplied settings for a run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Directory holding one sub-directory per profile.
    pub template_root: PathBuf,
    /// Profile to use when the override document does not name one.
    pub profile: Option<String>,
    /// Branch to commit to; [`CURRENT_BRANCH`] keeps the checked-out one.
    pub branch: Option<String>,
    pub commit: bool,
    pub commit_message: Option<String>,
    pub push: bool,
    /// Run the local verification tool after generation.
    pub verify: bool,
    /// Record the repository in the profile's package list.
    pub track: bool,
    /// Revision token to embed instead of computing one.
    pub revision: Option<String>,
}

impl SyncOptions {
    pub fn new(template_root: impl Into<PathBuf>) -> Self {
        Self {
            template_root: template_root.into(),
            profile: None,
            branch: None,
            commit: true,
            commit_message: None,
            push: false,
            verify: false,
            track: false,
            revision: None,
        }
    }
}

/// Run progress. A run that fails stops in [`SyncState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncState {
    Init,
    ProfileResolved,
    Generated,
    Cleaned,
    Validated,
    Committed,
    Done,
    Failed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One entry of a [`ChangeSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "path", rename_all = "lowercase")]
pub enum Change {
    Written(PathBuf),
    Removed(PathBuf),
}

impl Change {
    pub fn path(&self) -> &Path {
        match self {
            Change::Written(path) | Change::Removed(path) => path,
        }
    }
}

/// Paths touched by a run, relative to the repository root, in the order
/// they were touched. A path is recorded once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, change: Change) {
        if !self.changes.iter().any(|c| c.path() == change.path()) {
            self.changes.push(change);
        }
    }

    pub fn written(&mut self, path: impl Into<PathBuf>) {
        self.record(Change::Written(path.into()));
    }

    pub fn removed(&mut self, path: impl Into<PathBuf>) {
        self.record(Change::Removed(path.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    /// Every touched path.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.changes.iter().map(|c| c.path().to_path_buf()).collect()
    }

    /// Paths that still exist and need staging.
    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.changes
            .iter()
            .filter_map(|c| match c {
                Change::Written(path) => Some(path.clone()),
                Change::Removed(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub profile: String,
    pub revision: String,
    pub branch: String,
    /// The branch existed before the run (a previous run's PR is updated).
    pub updating_branch: bool,
    pub changes: ChangeSet,
    pub warnings: Vec<Warning>,
    /// Artifacts that could not be rendered.
    pub failed: Vec<String>,
    pub committed: bool,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives a synchronization run against the repository at `root`.
pub struct SyncOrchestrator<'a> {
    root: PathBuf,
    options: SyncOptions,
    vcs: &'a dyn Vcs,
    state: SyncState,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(root: impl Into<PathBuf>, options: SyncOptions, vcs: &'a dyn Vcs) -> Self {
        Self {
            root: root.into(),
            options,
            vcs,
            state: SyncState::Init,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    fn advance(&mut self, next: SyncState) {
        log::debug!("run state {} -> {}", self.state, next);
        self.state = next;
    }

    pub fn run(&mut self) -> Result<SyncReport> {
        match self.execute() {
            Ok(report) => Ok(report),
            Err(e) => {
                self.advance(SyncState::Failed);
                Err(e)
            }
        }
    }

    fn execute(&mut self) -> Result<SyncReport> {
        let root = self.root.clone();
        let mut diagnostics = Diagnostics::new();
        let mut changes = ChangeSet::new();

        // Init -> ProfileResolved
        if !root.join(".git").exists() {
            return Err(Error::Configuration {
                message: format!("{} is not a git repository", root.display()),
                hint: Some("Point the command at the root of a git checkout".to_string()),
            });
        }
        let mut document = store::load(&root)?;
        let profile = document
            .profile()
            .or_else(|| self.options.profile.clone())
            .ok_or_else(|| Error::Configuration {
                message: format!(
                    "No configuration type set in {} and none given",
                    OVERRIDE_FILE
                ),
                hint: Some("Pass --type <PROFILE> for the first run".to_string()),
            })?;
        let templates = TemplateResolver::for_profile(&self.options.template_root, &profile)?;
        let revision = self.revision(&templates);
        document.set(META_SECTION, PROFILE_KEY, toml::Value::String(profile.clone()));
        document.set(META_SECTION, REVISION_KEY, toml::Value::String(revision.clone()));

        let update_current_branch = self.options.branch.as_deref() == Some(CURRENT_BRANCH);
        let branch = self.branch_name(&profile)?;
        self.advance(SyncState::ProfileResolved);

        if self.options.track {
            let package = package_name(&root);
            tracking::track(templates.profile_dir(), &package)?;
        }

        // -> Generated
        changes.written(OVERRIDE_FILE);
        let generator = Generator {
            root: &root,
            document: &document,
            templates: &templates,
            hosts: self.hosts(&mut diagnostics),
            revision: &revision,
            update_current_branch,
        };
        let mut failed = Vec::new();
        for kind in ArtifactKind::ALL {
            match generator.generate(kind, &mut diagnostics) {
                Ok(paths) => paths.into_iter().for_each(|p| changes.written(p)),
                Err(e @ (Error::TemplateNotFound { .. } | Error::TemplateRender { .. })) => {
                    diagnostics.warn(kind.name(), e.to_string());
                    failed.push(kind.name().to_string());
                }
                Err(e) => return Err(e),
            }
        }
        self.advance(SyncState::Generated);

        // -> Cleaned
        self.remove_obsolete(&mut changes)?;
        store::save(&root, &document, &profile)?;
        self.advance(SyncState::Cleaned);

        // -> Validated
        if self.options.verify {
            if let Err(e) = workdir::in_dir(&root, run_verification) {
                diagnostics.warn(VERIFY_TOOL, e.to_string());
            }
        }
        let updating_branch = self.vcs.checkout_or_create(&branch)?;
        validate::validate_changes(&root, &changes.paths(), &mut diagnostics);
        self.advance(SyncState::Validated);

        // -> Committed
        let mut committed = false;
        if self.options.commit && !failed.is_empty() {
            diagnostics.warn(
                "commit",
                format!("not committing, failed to generate: {}", failed.join(", ")),
            );
        } else if self.options.commit {
            let message = self
                .options
                .commit_message
                .as_deref()
                .unwrap_or(DEFAULT_COMMIT_MESSAGE);
            self.vcs.stage_and_commit(&changes.written_paths(), message)?;
            committed = true;
            if self.options.push {
                self.vcs.push(&branch)?;
            }
            self.advance(SyncState::Committed);
        }

        validate::legacy_setup_cfg_sections(&root, &mut diagnostics)?;
        self.advance(SyncState::Done);

        Ok(SyncReport {
            profile,
            revision,
            branch,
            updating_branch,
            changes,
            warnings: diagnostics.into_warnings(),
            failed,
            committed,
        })
    }

    /// Explicit token, else the template checkout's short hash, else a hash
    /// of the visible templates.
    fn revision(&self, templates: &TemplateResolver) -> String {
        if let Some(revision) = &self.options.revision {
            return revision.clone();
        }
        match GitCli::new(&self.options.template_root).short_revision() {
            Ok(hash) if !hash.is_empty() => hash,
            Ok(_) | Err(_) => {
                log::debug!("template root is not a git checkout, hashing templates");
                templates.content_hash()
            }
        }
    }

    fn branch_name(&self, profile: &str) -> Result<String> {
        let requested = match self.options.branch.as_deref() {
            Some(CURRENT_BRANCH) => self.vcs.current_branch()?,
            Some(name) => name.to_string(),
            None => String::new(),
        };
        if requested.is_empty() {
            Ok(default_branch_name(profile))
        } else {
            Ok(requested)
        }
    }

    fn hosts(&self, diagnostics: &mut Diagnostics) -> HostFlags {
        let hosts = match self.vcs.current_remote_url() {
            Ok(remote) => vcs::detect_host(&remote),
            Err(e) => {
                log::debug!("cannot read origin remote: {}", e);
                HostFlags::default()
            }
        };
        if hosts.none() {
            diagnostics.warn(CI_PREFIX, NO_CI_HOST);
        }
        hosts
    }

    fn remove_obsolete(&self, changes: &mut ChangeSet) -> Result<()> {
        for name in OBSOLETE_FILES {
            let relative = Path::new(name);
            if self.root.join(relative).exists() {
                self.vcs.remove(relative)?;
                log::info!("removed {}", name);
                changes.removed(relative);
            }
        }
        Ok(())
    }
}

/// Name recorded in the package list: the repository directory name.
fn package_name(root: &Path) -> String {
    root.canonicalize()
        .unwrap_or_else(|_| root.to_path_buf())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Run the verification tool in the current directory, preferring one on
/// `PATH` over a local `bin/` install.
fn run_verification() -> Result<()> {
    let status = match Command::new(VERIFY_TOOL).args(VERIFY_ARGS).status() {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Command::new(Path::new("bin").join(VERIFY_TOOL))
                .args(VERIFY_ARGS)
                .status()
        }
        other => other,
    }
    .map_err(|e| Error::ExternalTool {
        tool: VERIFY_TOOL.to_string(),
        message: e.to_string(),
    })?;
    if !status.success() {
        return Err(Error::ExternalTool {
            tool: VERIFY_TOOL.to_string(),
            message: format!("exited with {}", status),
        });
    }
    Ok(())
}
