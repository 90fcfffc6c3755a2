//! # Profiles Command Implementation
//!
//! Lists the configuration profiles under the template root. For every
//! profile other than the shared one, the templates it overrides are shown.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use repo_meta::defaults::{SHARED_TEMPLATE_DIR, TEMPLATES_ENV};
use repo_meta::output::{emoji, OutputConfig};
use repo_meta::suggestions;
use repo_meta::template::{self, TemplateResolver};
use repo_meta::tracking;

/// List the available configuration profiles
#[derive(Args, Debug)]
pub struct ProfilesArgs {
    /// Directory containing one template directory per profile
    #[arg(long, value_name = "DIR", env = TEMPLATES_ENV)]
    pub templates: Option<PathBuf>,

    /// Also list the packages tracked for each profile
    #[arg(long)]
    pub packages: bool,
}

/// Execute the `profiles` command.
pub fn execute(args: ProfilesArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let root = super::template_root(args.templates);
    if !root.is_dir() {
        return Err(suggestions::template_root_missing(&root));
    }

    let profiles = template::available_profiles(&root);
    if profiles.is_empty() {
        println!(
            "{} No profiles found in {}",
            emoji(&out, "⚠️", "[WARN]"),
            root.display()
        );
        return Ok(());
    }

    println!(
        "{} Profiles in {}:",
        emoji(&out, "📂", "[DIR]"),
        root.display()
    );
    for profile in profiles {
        let resolver = TemplateResolver::for_profile(&root, &profile)?;
        if profile == SHARED_TEMPLATE_DIR {
            println!("  {} (shared)", profile);
        } else {
            let own: Vec<String> = resolver
                .templates()
                .into_iter()
                .filter(|(name, path)| {
                    name != tracking::PACKAGES_FILE && path.starts_with(resolver.profile_dir())
                })
                .map(|(name, _)| name)
                .collect();
            if own.is_empty() {
                println!("  {}", profile);
            } else {
                println!("  {} (overrides: {})", profile, own.join(", "));
            }
        }
        if args.packages {
            for package in tracking::tracked(resolver.profile_dir())? {
                println!("    - {}", package);
            }
        }
    }
    Ok(())
}
