//! `armgen validate`: re-check an existing deployment template.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::core::user_friendly_error;
use crate::template::Template;
use crate::utils::expand_path;

/// Output format for `armgen validate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Colored human-readable output.
    Text,
    /// A single JSON object on stdout.
    Json,
}

/// Validate a template file.
///
/// The document is parsed and every assembly check is re-run: duplicate
/// resources, dangling `dependsOn` entries, dependency cycles, and parameter
/// references. The embedded `templateHash` is compared with a freshly computed
/// one so hand edits are reported.
#[derive(Args)]
pub struct ValidateCommand {
    /// Template file to validate
    #[arg(value_name = "TEMPLATE")]
    template: String,

    /// Print resources in deployment order
    #[arg(long)]
    order: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// JSON report printed with `--format json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub resources: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_hash: Option<String>,
    /// `false` when the stored hash is missing or differs from the content.
    pub hash_matches: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deployment_order: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ValidateCommand {
    pub fn execute(self) -> Result<()> {
        let path = expand_path(&self.template);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read template: {}", path.display()))?;

        let template = match Template::from_json_str(&content) {
            Ok(template) => template,
            Err(error) if self.format == OutputFormat::Json => {
                let report = ValidationReport {
                    valid: false,
                    resources: 0,
                    template_hash: None,
                    hash_matches: false,
                    deployment_order: Vec::new(),
                    errors: vec![user_friendly_error(error.clone().into()).to_string()],
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Err(anyhow!(error));
            }
            Err(error) => {
                return Err(anyhow!(error))
                    .with_context(|| format!("Template {} is invalid", path.display()));
            }
        };

        let hash_matches = stored_hash(&content).as_deref() == Some(template.template_hash());

        match self.format {
            OutputFormat::Json => {
                let report = ValidationReport {
                    valid: true,
                    resources: template.resources().len(),
                    template_hash: Some(template.template_hash().to_string()),
                    hash_matches,
                    deployment_order: if self.order {
                        deployment_order(&template)
                    } else {
                        Vec::new()
                    },
                    errors: Vec::new(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                println!(
                    "{} {} is valid ({} resource(s))",
                    "✓".green(),
                    path.display().to_string().bold(),
                    template.resources().len()
                );
                if !hash_matches {
                    println!(
                        "{} templateHash is missing or stale; regenerate to refresh it",
                        "⚠".yellow()
                    );
                }
                if self.order {
                    println!("\n{}", "Deployment order:".bold());
                    for (position, reference) in deployment_order(&template).iter().enumerate() {
                        println!("  {}. {reference}", position + 1);
                    }
                }
            }
        }

        Ok(())
    }
}

fn deployment_order(template: &Template) -> Vec<String> {
    template.deployment_order().iter().map(|r| r.reference().to_string()).collect()
}

fn stored_hash(content: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    value
        .pointer("/metadata/_generator/templateHash")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}
