//! # Version Control Collaborator
//!
//! The orchestrator talks to version control only through the [`Vcs`] trait,
//! so runs can be exercised in tests without a real repository. [`GitCli`] is
//! the production implementation and shells out to the system `git`, which
//! picks up the user's SSH keys, credential helpers and `~/.gitconfig`.
//!
//! This module also holds hosting-provider detection, which only looks at the
//! `origin` remote URL.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use url::Url;

use crate::error::{Error, Result};

/// Version control operations needed by a synchronization run.
pub trait Vcs {
    /// URL of the `origin` remote.
    fn current_remote_url(&self) -> Result<String>;

    /// Short hash of the checked-out commit.
    fn short_revision(&self) -> Result<String>;

    /// Name of the checked-out branch (empty when detached).
    fn current_branch(&self) -> Result<String>;

    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Switch to `name`, creating it if needed. Returns `true` if the branch
    /// already existed.
    fn checkout_or_create(&self, name: &str) -> Result<bool>;

    /// Remove a tracked file from the work tree and the index.
    fn remove(&self, path: &Path) -> Result<()>;

    fn stage_and_commit(&self, paths: &[PathBuf], message: &str) -> Result<()>;

    fn push(&self, branch: &str) -> Result<()>;
}

/// [`Vcs`] backed by the `git` command line, run inside `root`.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run<I, S>(&self, args: I) -> Result<(String, Output)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        let command = format!(
            "git {}",
            args.iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(" ")
        );
        log::debug!("running `{}` in {}", command, self.root.display());

        let output = Command::new("git")
            .args(&args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::GitCommand {
                command: command.clone(),
                stderr: e.to_string(),
            })?;
        Ok((command, output))
    }

    fn git<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (command, output) = self.run(args)?;
        if !output.status.success() {
            return Err(Error::GitCommand {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn first_line(output: &str) -> String {
    output.lines().next().unwrap_or_default().trim().to_string()
}

impl Vcs for GitCli {
    fn current_remote_url(&self) -> Result<String> {
        Ok(first_line(&self.git(["remote", "get-url", "origin"])?))
    }

    fn short_revision(&self) -> Result<String> {
        Ok(first_line(&self.git(["rev-parse", "--short=8", "HEAD"])?))
    }

    fn current_branch(&self) -> Result<String> {
        Ok(first_line(&self.git(["branch", "--show-current"])?))
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        let branches = self.git(["branch", "--format", "%(refname:short)"])?;
        Ok(branches.lines().any(|branch| branch.trim() == name))
    }

    fn checkout_or_create(&self, name: &str) -> Result<bool> {
        if self.branch_exists(name)? {
            self.git(["checkout", name])?;
            Ok(true)
        } else {
            self.git(["checkout", "-b", name])?;
            Ok(false)
        }
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.git([OsStr::new("rm"), OsStr::new("-q"), path.as_os_str()])?;
        Ok(())
    }

    fn stage_and_commit(&self, paths: &[PathBuf], message: &str) -> Result<()> {
        let mut add: Vec<OsString> = vec!["add".into(), "--".into()];
        add.extend(paths.iter().map(|p| p.as_os_str().to_os_string()));
        self.git(add)?;

        // `diff --cached --quiet` exits 0 when nothing is staged.
        let (_, staged) = self.run(["diff", "--cached", "--quiet"])?;
        if staged.status.success() {
            log::info!("nothing changed, not committing");
            return Ok(());
        }
        self.git(["commit", "-m", message])?;
        Ok(())
    }

    fn push(&self, branch: &str) -> Result<()> {
        self.git(["push", "--set-upstream", "origin", branch])?;
        Ok(())
    }
}

/// Which hosting providers a remote URL points at.
///
/// Both flags are computed independently; a remote matching neither (or,
/// improbably, both) is reported as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostFlags {
    pub github: bool,
    pub gitlab: bool,
}

impl HostFlags {
    pub fn none(&self) -> bool {
        !self.github && !self.gitlab
    }
}

/// Extract the host of a remote URL.
///
/// Handles URL-form remotes (`https://`, `ssh://`, `git://`) and scp-form
/// remotes (`git@github.com:org/repo.git`).
pub fn remote_host(remote: &str) -> Option<String> {
    if let Ok(url) = Url::parse(remote) {
        if let Some(host) = url.host_str() {
            return Some(host.to_ascii_lowercase());
        }
    }
    let (prefix, _) = remote.split_once(':')?;
    let host = prefix.rsplit('@').next()?;
    if host.is_empty() || host.contains('/') {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

/// Detect the hosting provider from a remote URL.
pub fn detect_host(remote: &str) -> HostFlags {
    let host = remote_host(remote).unwrap_or_else(|| remote.to_ascii_lowercase());
    HostFlags {
        github: host.contains("github"),
        gitlab: host.contains("gitlab"),
    }
}
