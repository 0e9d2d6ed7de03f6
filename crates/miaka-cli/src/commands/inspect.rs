//! Inspect command - show the schema inferred from a values file

use clap::ValueEnum;
use console::style;
use miaka_core::{Schema, SchemaBuilder, UnknownPosition, UnknownTypeEntry, find_unknown_types};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::commands::read_file;
use crate::config::ProjectConfig;
use crate::display::{Finding, IssueReport, pluralize, write_schema};
use crate::error::{CliError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Yaml,
    Json,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectOutput<'a> {
    schema: &'a Schema,
    unknown_types: &'a [UnknownTypeEntry],
}

pub fn run(values: &Path, output: OutputFormat) -> Result<()> {
    let chart = values.parent().unwrap_or(Path::new("."));
    let config = ProjectConfig::load(chart)?;

    let text = read_file(values)?;
    let schema = SchemaBuilder::new(config.build.clone()).build(&text)?;
    let unknown = find_unknown_types(&schema);

    let document = InspectOutput {
        schema: &schema,
        unknown_types: &unknown,
    };
    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&document)
                .map_err(|e| CliError::other(format!("Failed to serialize the schema: {e}")))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&document)
                .map_err(|e| CliError::other(format!("Failed to serialize the schema: {e}")))?;
            print!("{yaml}");
        }
        OutputFormat::Text => {
            let mut stdout = std::io::stdout().lock();
            write_schema(&mut stdout, &schema)?;
            stdout.flush()?;
            drop(stdout);

            report_unknown(values, &unknown, &config.build.marker_tool)?;
        }
    }

    Ok(())
}

fn report_unknown(values: &Path, unknown: &[UnknownTypeEntry], marker_tool: &str) -> Result<()> {
    if unknown.is_empty() {
        println!();
        println!("{} Every field has a type", style("✓").green());
        return Ok(());
    }

    let mut report = IssueReport::new(values.display().to_string());
    for entry in unknown {
        let what = match entry.position {
            UnknownPosition::Field => "Type",
            UnknownPosition::ListElement => "Element type",
        };
        let anchor = entry
            .line
            .map(|line| format!("line {line}"))
            .unwrap_or_else(|| format!("'{}'", entry.source_key));
        report.push(
            Finding::warning(&entry.path, format!("{what} of '{}' is unknown", entry.source_key))
                .at_line(entry.line)
                .with_hint(format!("add `# +{marker_tool}:type:<type>` above {anchor}")),
        );
    }
    report.write_to(&mut std::io::stdout())?;

    println!();
    println!(
        "{} {} without a type, add hints before generating a CRD",
        style("⚠").yellow().bold(),
        pluralize(unknown.len(), "field", "fields")
    );
    Ok(())
}
