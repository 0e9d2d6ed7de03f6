//! Generate command - values.yaml to CRD and values.schema.json

use clap::Args;
use console::style;
use miaka_core::infer_schema;
use miaka_crd::{
    CompatibilityDecision, CompatibilityPolicy, CrdAnalysis, CrdGenerator, CrdParser, CrdScope,
    CustomResourceDefinition, JsonSchemaTranslator, analyze_generated,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::commands::{confirm, is_interactive, read_file, spinner, write_file};
use crate::config::ProjectConfig;
use crate::display::CrdDiffRenderer;
use crate::error::{CliError, Result};

#[derive(Debug, Clone, Default, Args)]
pub struct GenerateArgs {
    /// Chart directory
    #[arg(default_value = ".")]
    pub chart: PathBuf,

    /// Values file [default: <CHART>/values.yaml]
    #[arg(short = 'f', long = "values")]
    pub values: Option<PathBuf>,

    /// CRD output path [default: <CHART>/crds/<plural>.<group>.yaml]
    #[arg(long)]
    pub crd_out: Option<PathBuf>,

    /// JSON Schema output path [default: <CHART>/values.schema.json]
    #[arg(long)]
    pub schema_out: Option<PathBuf>,

    /// API group, used when apiVersion has none
    #[arg(long)]
    pub group: Option<String>,

    /// API version, used when values.yaml has no apiVersion
    #[arg(long)]
    pub version: Option<String>,

    /// Plural resource name
    #[arg(long)]
    pub plural: Option<String>,

    /// Resource scope (Namespaced or Cluster)
    #[arg(long)]
    pub scope: Option<CrdScope>,

    /// Compatibility policy against the existing CRD (safe, strict, force)
    #[arg(long)]
    pub policy: Option<CompatibilityPolicy>,

    /// Write even if the policy rejects the changes
    #[arg(short, long)]
    pub yes: bool,

    /// Print the outputs instead of writing them
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateArgs {
    /// Flags win over miaka.yaml
    fn apply(&self, config: &mut ProjectConfig) {
        if let Some(group) = &self.group {
            config.crd.group = Some(group.clone());
        }
        if let Some(version) = &self.version {
            config.crd.version = Some(version.clone());
        }
        if let Some(plural) = &self.plural {
            config.crd.plural = Some(plural.clone());
        }
        if let Some(scope) = self.scope {
            config.crd.scope = scope;
        }
        if let Some(policy) = self.policy {
            config.compatibility = policy;
        }
    }
}

struct Generated {
    crd: CustomResourceDefinition,
    json_schema: Value,
    crd_path: PathBuf,
    schema_path: PathBuf,
    analysis: CrdAnalysis,
}

pub fn run(args: &GenerateArgs) -> Result<()> {
    let values_path = args
        .values
        .clone()
        .unwrap_or_else(|| args.chart.join("values.yaml"));

    let mut config = ProjectConfig::load(&args.chart)?;
    args.apply(&mut config);
    debug!(?config, "project configuration");

    eprintln!(
        "{} Generating from {}",
        style("→").blue(),
        style(values_path.display()).cyan()
    );

    let pb = spinner("Inferring schema");
    let outcome = pipeline(&config, args, &values_path, |stage| pb.set_message(stage));
    pb.finish_and_clear();
    let generated = outcome?;

    check_compatibility(&generated.analysis, config.compatibility, args.yes)?;

    let crd_yaml = serde_yaml::to_string(&generated.crd)
        .map_err(|e| CliError::other(format!("Failed to serialize the CRD: {e}")))?;
    let schema_json = serde_json::to_string_pretty(&generated.json_schema)
        .map_err(|e| CliError::other(format!("Failed to serialize the JSON Schema: {e}")))?
        + "\n";

    if args.dry_run {
        println!("# Source: {}", generated.crd_path.display());
        print!("{crd_yaml}");
        println!("# Source: {}", generated.schema_path.display());
        print!("{schema_json}");
        return Ok(());
    }

    write_file(&generated.crd_path, &crd_yaml)?;
    write_file(&generated.schema_path, &schema_json)?;
    info!(
        crd = %generated.crd_path.display(),
        schema = %generated.schema_path.display(),
        "outputs written"
    );

    println!(
        "{} Wrote CRD {}",
        style("✓").green(),
        style(generated.crd_path.display()).bold()
    );
    println!(
        "{} Wrote JSON Schema {}",
        style("✓").green(),
        style(generated.schema_path.display()).bold()
    );

    Ok(())
}

/// Infer, generate, translate and compare against the CRD already on disk
///
/// Output paths given as flags are taken as-is; configured ones are
/// relative to the chart.
fn pipeline(
    config: &ProjectConfig,
    args: &GenerateArgs,
    values_path: &Path,
    stage: impl Fn(&'static str),
) -> Result<Generated> {
    let text = read_file(values_path)?;
    let schema = infer_schema(&values_path.display().to_string(), &text, &config.build)?;
    info!(
        kind = %schema.resource_kind,
        structs = schema.structs.len(),
        "schema inferred"
    );

    stage("Generating CRD");
    let generator = CrdGenerator::new(config.crd.clone());
    let crd = generator.generate(&schema)?;
    let crd_name = generator.crd_name(&schema)?;

    stage("Translating to JSON Schema");
    let json_schema =
        JsonSchemaTranslator::new(config.crd.strict_json_schema).translate(&crd, None)?;

    stage("Checking compatibility");
    let crd_path = args
        .crd_out
        .clone()
        .unwrap_or_else(|| config.crd_path(&args.chart, &crd_name));
    let schema_path = args
        .schema_out
        .clone()
        .unwrap_or_else(|| config.json_schema_path(&args.chart));
    let previous = if crd_path.exists() {
        debug!(path = %crd_path.display(), "comparing with existing CRD");
        Some(CrdParser::parse(&read_file(&crd_path)?)?)
    } else {
        None
    };
    let analysis = analyze_generated(previous.as_ref(), &crd)?;

    Ok(Generated {
        crd,
        json_schema,
        crd_path,
        schema_path,
        analysis,
    })
}

fn check_compatibility(analysis: &CrdAnalysis, policy: CompatibilityPolicy, yes: bool) -> Result<()> {
    if !analysis.is_new && !analysis.changes.is_empty() {
        CrdDiffRenderer::new().render(analysis)?;
    }

    let CompatibilityDecision::Reject { reason, .. } = policy.decide(analysis) else {
        return Ok(());
    };

    eprintln!(
        "\n{} The {} policy rejects this update: {}",
        style("⚠").yellow(),
        policy,
        reason
    );

    if yes {
        eprintln!("  Continuing because of --yes");
        return Ok(());
    }
    if is_interactive() && confirm("Write the CRD anyway?")? {
        return Ok(());
    }

    Err(CliError::BreakingChange { reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_project_file() {
        let mut config = ProjectConfig::from_yaml(
            "crd:\n  group: from.file\n  plural: fromfile\ncompatibility: strict\n",
        )
        .unwrap();

        let args = GenerateArgs {
            group: Some("from.flag".to_string()),
            scope: Some(CrdScope::Cluster),
            policy: Some(CompatibilityPolicy::Force),
            ..Default::default()
        };
        args.apply(&mut config);

        assert_eq!(config.crd.group.as_deref(), Some("from.flag"));
        assert_eq!(config.crd.plural.as_deref(), Some("fromfile"));
        assert_eq!(config.crd.scope, CrdScope::Cluster);
        assert_eq!(config.compatibility, CompatibilityPolicy::Force);
    }

    #[test]
    fn test_pipeline_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let values = dir.path().join("values.yaml");
        std::fs::write(
            &values,
            "apiVersion: example.com/v1\nkind: Demo\n# Replica count\nreplicas: 1\n",
        )
        .unwrap();

        let args = GenerateArgs {
            chart: dir.path().to_path_buf(),
            schema_out: Some(PathBuf::from("schema.json")),
            ..Default::default()
        };
        let generated = pipeline(&ProjectConfig::default(), &args, &values, |_| {}).unwrap();

        assert!(generated.analysis.is_new);
        assert_eq!(
            generated.crd_path,
            dir.path().join("crds").join("demos.example.com.yaml")
        );
        assert_eq!(generated.schema_path, PathBuf::from("schema.json"));
        assert_eq!(generated.json_schema["title"], "Demo");
        assert!(!generated.crd_path.exists());
    }

    #[test]
    fn test_force_and_yes_accept_rejections() {
        let analysis = CrdAnalysis {
            crd_name: "demos.example.com".to_string(),
            changes: vec![miaka_crd::CrdChange {
                kind: miaka_crd::ChangeKind::RemoveField,
                path: "spec.versions[v1].schema.properties.replicas".to_string(),
                message: "Field 'replicas' removed".to_string(),
                old_value: Some("integer".to_string()),
                new_value: None,
            }],
            is_new: false,
        };

        assert!(check_compatibility(&analysis, CompatibilityPolicy::Force, false).is_ok());
        assert!(check_compatibility(&analysis, CompatibilityPolicy::Safe, true).is_ok());
    }
}
