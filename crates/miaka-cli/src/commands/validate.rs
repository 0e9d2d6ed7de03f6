//! Validate command - check a values file against a generated schema

use console::style;
use miaka_crd::{CrdError, CustomResourceDefinition, InstanceValidator};
use serde_json::{Value, json};
use std::path::Path;
use tracing::debug;

use crate::commands::read_document;
use crate::display::{Finding, IssueReport, pluralize};
use crate::error::{CliError, Result};

/// `--schema` may be a JSON Schema or a CRD manifest
fn is_crd(document: &Value) -> bool {
    document.get("kind").and_then(Value::as_str) == Some("CustomResourceDefinition")
}

pub fn run(instance: &Path, schema: &Path, json_output: bool) -> Result<()> {
    let schema_document = read_document(schema)?;
    let validator = if is_crd(&schema_document) {
        debug!(path = %schema.display(), "validating against a CRD");
        let crd: CustomResourceDefinition =
            serde_json::from_value(schema_document).map_err(CrdError::from)?;
        InstanceValidator::from_crd(&crd)?
    } else {
        InstanceValidator::new(&schema_document)?
    };

    let document = read_document(instance)?;
    let result = validator.validate(&document);

    if json_output {
        let output = json!({
            "valid": result.is_valid(),
            "instance": instance.display().to_string(),
            "schema": schema.display().to_string(),
            "errors": result.errors,
        });
        let text = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::other(format!("Failed to serialize the result: {e}")))?;
        println!("{text}");
    } else {
        println!(
            "{} Validating {} against {}",
            style("→").blue(),
            style(instance.display()).cyan(),
            style(schema.display()).cyan()
        );

        let mut report = IssueReport::new(instance.display().to_string());
        for issue in &result.errors {
            report.push(Finding::error(&issue.path, &issue.message));
        }
        let mut stdout = std::io::stdout();
        report.write_to(&mut stdout)?;
        println!();
        report.write_summary(&mut stdout)?;
    }

    if result.is_valid() {
        return Ok(());
    }

    Err(CliError::validation_with_help(
        format!(
            "{} does not match {} ({})",
            instance.display(),
            schema.display(),
            pluralize(result.errors.len(), "error", "errors")
        ),
        "fix the values above or regenerate the schema with `miaka generate`",
    ))
}
