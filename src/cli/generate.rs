//! `armgen generate`: build a deployment template from a manifest.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::DEFAULT_TEMPLATE_FILE_NAME;
use crate::manifest::{Manifest, find_manifest_with_optional};
use crate::utils::{expand_path, safe_write};

/// Build a deployment template from `armgen.toml`.
///
/// The template is assembled in memory and checked for duplicates, dangling
/// dependencies, cycles, and undeclared parameters before anything is written.
/// Nothing is written when any check fails.
#[derive(Args)]
pub struct GenerateCommand {
    /// Manifest file to read
    ///
    /// Defaults to the nearest `armgen.toml` in the current directory or its parents.
    #[arg(short, long, value_name = "PATH")]
    manifest: Option<String>,

    /// Where to write the template (`-` for stdout)
    ///
    /// Defaults to `azuredeploy.json` next to the manifest.
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Write single-line JSON instead of pretty-printed output
    #[arg(long)]
    compact: bool,
}

impl GenerateCommand {
    pub fn execute(self) -> Result<()> {
        let manifest_path = find_manifest_with_optional(self.manifest.as_deref().map(expand_path))?;
        debug!("Using manifest {}", manifest_path.display());

        let manifest = Manifest::load(&manifest_path)?;
        let template = manifest
            .build_template()
            .with_context(|| format!("Failed to build template from {}", manifest_path.display()))?;
        let mut json = template.to_json_string(!self.compact)?;
        json.push('\n');

        match self.output.as_deref() {
            Some("-") => {
                print!("{json}");
            }
            output => {
                let path = output_path(output, &manifest_path);
                safe_write(&path, &json)
                    .with_context(|| format!("Failed to write template to {}", path.display()))?;
                info!(hash = template.template_hash(), "Template written to {}", path.display());
                println!(
                    "{} Generated {} resource(s) → {}",
                    "✓".green(),
                    template.resources().len(),
                    path.display().to_string().bold()
                );
            }
        }

        Ok(())
    }
}

fn output_path(explicit: Option<&str>, manifest_path: &Path) -> PathBuf {
    match explicit {
        Some(path) => expand_path(path),
        None => manifest_path
            .parent()
            .map(|dir| dir.join(DEFAULT_TEMPLATE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_FILE_NAME)),
    }
}
