//! # Validate Command Implementation
//!
//! Read-only check of a configured repository: parses every generated file
//! that is present with the parser for its format and reports `setup.cfg`
//! sections that the generated files have replaced.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use repo_meta::artifacts::ArtifactKind;
use repo_meta::defaults::OVERRIDE_FILE;
use repo_meta::error::Diagnostics;
use repo_meta::output::{emoji, format_warning, OutputConfig};
use repo_meta::validate;

/// Check the generated files of a repository
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the repository to check
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Treat legacy setup.cfg sections as errors too
    #[arg(long)]
    pub strict: bool,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let root = &args.path;
    println!(
        "{} Validating generated files in {}",
        emoji(&out, "🔍", "[SCAN]"),
        root.display()
    );

    let mut files = vec![PathBuf::from(OVERRIDE_FILE)];
    files.extend(ArtifactKind::ALL.iter().flat_map(|kind| kind.outputs()));
    let present: Vec<PathBuf> = files
        .into_iter()
        .filter(|file| root.join(file).is_file())
        .collect();
    if present.is_empty() {
        println!(
            "{} No generated files found",
            emoji(&out, "⚠️", "[WARN]")
        );
    }

    let mut structural = Diagnostics::new();
    validate::validate_changes(root, &present, &mut structural);
    for file in &present {
        let ok = structural
            .warnings()
            .iter()
            .all(|w| w.prefix != file.display().to_string());
        if ok {
            println!("{} {}", emoji(&out, "✅", "[OK]"), file.display());
        }
    }

    let mut legacy = Diagnostics::new();
    validate::legacy_setup_cfg_sections(root, &mut legacy)?;

    for warning in structural.warnings().iter().chain(legacy.warnings()) {
        println!("{}", format_warning(&out, warning));
    }

    let errors = structural.warnings().len() + if args.strict { legacy.warnings().len() } else { 0 };
    if errors > 0 {
        anyhow::bail!("Validation failed with {} problem(s)", errors);
    }
    println!(
        "\n{} All generated files are valid",
        emoji(&out, "✅", "[OK]")
    );
    Ok(())
}
