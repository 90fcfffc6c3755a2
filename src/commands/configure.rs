//! # Configure Command Implementation
//!
//! Runs a full synchronization against one repository: generate every
//! configuration file for the chosen profile, clean up, validate and hand the
//! result to git. The run summary and warnings are printed at the end; the
//! command fails if any artifact could not be generated.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use repo_meta::defaults::TEMPLATES_ENV;
use repo_meta::orchestrator::{SyncOptions, SyncOrchestrator};
use repo_meta::output::{self, emoji, OutputConfig};
use repo_meta::store;
use repo_meta::suggestions;
use repo_meta::template;
use repo_meta::vcs::GitCli;

/// Generate the configuration files of a repository
#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Path to the repository to configure
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Configuration type (profile); only needed when .meta.toml names none
    #[arg(short = 't', long = "type", value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Commit message to use instead of the default one
    #[arg(short = 'm', long, value_name = "MSG")]
    pub commit_msg: Option<String>,

    /// Leave the changes uncommitted
    #[arg(long)]
    pub no_commit: bool,

    /// Push the branch after committing
    #[arg(long, conflicts_with = "no_commit")]
    pub push: bool,

    /// Branch to commit to. Use "current" to update the checked-out branch
    /// without adding a news entry.
    #[arg(short, long, value_name = "NAME")]
    pub branch: Option<String>,

    /// Run tox (format and lint) after generating the files
    #[arg(long)]
    pub tox: bool,

    /// Add the repository to the profile's packages.txt
    #[arg(long)]
    pub track: bool,

    /// Directory containing one template directory per profile
    #[arg(long, value_name = "DIR", env = TEMPLATES_ENV)]
    pub templates: Option<PathBuf>,

    /// Revision token to embed instead of the templates' commit hash
    #[arg(long, value_name = "TOKEN", env = "REPO_META_REVISION")]
    pub revision: Option<String>,

    /// Print the run report as JSON instead of the summary
    #[arg(long)]
    pub json: bool,
}

/// Execute the `configure` command.
pub fn execute(args: ConfigureArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    if !args.path.join(".git").exists() {
        return Err(suggestions::not_a_repository(&args.path));
    }
    let root = args.path.canonicalize()?;

    let template_root = super::template_root(args.templates);
    if !template_root.is_dir() {
        return Err(suggestions::template_root_missing(&template_root));
    }
    let recorded = store::load(&root).map_err(suggestions::explain)?.profile();
    if let Some(profile) = effective_profile(recorded, args.profile.as_deref()) {
        let available = template::available_profiles(&template_root);
        if !available.contains(&profile) {
            return Err(suggestions::unknown_profile(&profile, &available));
        }
    }

    let options = SyncOptions {
        profile: args.profile,
        branch: args.branch,
        commit: !args.no_commit,
        commit_message: args.commit_msg,
        push: args.push,
        verify: args.tox,
        track: args.track,
        revision: args.revision,
        ..SyncOptions::new(template_root)
    };

    if !args.json {
        println!(
            "{} Configuring {}",
            emoji(&out, "🔧", "[RUN]"),
            root.display()
        );
    }
    let git = GitCli::new(&root);
    let report = SyncOrchestrator::new(&root, options, &git)
        .run()
        .map_err(suggestions::explain)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in output::summary(&out, &report) {
            println!("{}", line);
        }
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} artifact(s) could not be generated: {}",
            report.failed.len(),
            report.failed.join(", ")
        );
    }
    Ok(())
}

/// The profile a run will use: the one recorded in `.meta.toml` wins over the
/// command line.
fn effective_profile(recorded: Option<String>, requested: Option<&str>) -> Option<String> {
    match (recorded, requested) {
        (Some(recorded), Some(requested)) if recorded != requested => {
            log::info!(
                "using profile {} from .meta.toml, ignoring --type {}",
                recorded,
                requested
            );
            Some(recorded)
        }
        (Some(recorded), _) => Some(recorded),
        (None, requested) => requested.map(str::to_string),
    }
}
