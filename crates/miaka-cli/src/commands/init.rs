//! Init command - declare apiVersion and kind in a chart's values.yaml

use clap::Args;
use console::style;
use miaka_core::SchemaError;
use std::path::{Path, PathBuf};

use crate::commands::{is_interactive, prompt, read_file, write_file};
use crate::error::{CliError, Result};

const DEFAULT_VERSION: &str = "v1alpha1";

#[derive(Debug, Clone, Default, Args)]
pub struct InitArgs {
    /// Chart directory
    #[arg(default_value = ".")]
    pub chart: PathBuf,

    /// API group, e.g. charts.example.com
    #[arg(long)]
    pub group: Option<String>,

    /// Resource kind [default: chart directory name in CamelCase]
    #[arg(long)]
    pub kind: Option<String>,

    /// API version [default: v1alpha1]
    #[arg(long)]
    pub version: Option<String>,
}

pub fn run(args: &InitArgs) -> Result<()> {
    let values_path = args.chart.join("values.yaml");
    let existing = if values_path.exists() {
        read_file(&values_path)?
    } else {
        String::new()
    };

    let (has_api_version, has_kind) = declared_keys(&existing)?;
    if has_api_version && has_kind {
        println!(
            "{} {} already declares apiVersion and kind",
            style("✓").green(),
            style(values_path.display()).bold()
        );
        return Ok(());
    }

    let interactive = is_interactive();
    let mut header = String::new();

    if !has_api_version {
        let group = resolve(args.group.as_deref(), "group", "API group", None, interactive)?;
        check_group(&group)?;
        let version = resolve(
            args.version.as_deref(),
            "version",
            "API version",
            Some(DEFAULT_VERSION),
            interactive,
        )?;
        check_version(&version)?;
        header.push_str(&format!("apiVersion: {group}/{version}\n"));
    }

    if !has_kind {
        let default_kind = chart_name(&args.chart).and_then(|name| kind_from_name(&name));
        let kind = resolve(
            args.kind.as_deref(),
            "kind",
            "Kind",
            default_kind.as_deref(),
            interactive,
        )?;
        check_kind(&kind)?;
        header.push_str(&format!("kind: {kind}\n"));
    }

    // The blank line keeps the header from taking over the first field's comments
    let contents = if existing.trim().is_empty() {
        header
    } else {
        format!("{header}\n{existing}")
    };
    write_file(&values_path, &contents)?;

    println!(
        "{} Initialized {}",
        style("✓").green(),
        style(values_path.display()).bold()
    );
    println!(
        "  Next: {}",
        style(format!("miaka generate {}", args.chart.display())).cyan()
    );

    Ok(())
}

/// Whether the document already has top-level `apiVersion` and `kind`
fn declared_keys(text: &str) -> Result<(bool, bool)> {
    let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(SchemaError::from)?;
    match value {
        serde_yaml::Value::Null => Ok((false, false)),
        serde_yaml::Value::Mapping(map) => Ok((
            map.contains_key("apiVersion"),
            map.contains_key("kind"),
        )),
        _ => Err(CliError::usage("values.yaml must be a mapping")),
    }
}

/// Flag value, else an answer from the terminal, else the default
fn resolve(
    flag_value: Option<&str>,
    flag: &str,
    label: &str,
    default: Option<&str>,
    interactive: bool,
) -> Result<String> {
    if let Some(value) = flag_value {
        return Ok(value.to_string());
    }
    if interactive {
        return prompt(label, default);
    }
    default.map(String::from).ok_or_else(|| {
        CliError::usage_with_help(
            format!("--{flag} is required when not running in a terminal"),
            format!("pass --{flag} <VALUE>"),
        )
    })
}

fn chart_name(chart: &Path) -> Option<String> {
    let path = chart.canonicalize().ok()?;
    Some(path.file_name()?.to_string_lossy().into_owned())
}

/// `my-web-app` becomes `MyWebApp`
fn kind_from_name(name: &str) -> Option<String> {
    let kind: String = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    kind.starts_with(|c: char| c.is_ascii_uppercase())
        .then_some(kind)
}

fn check_kind(kind: &str) -> Result<()> {
    let valid = kind.starts_with(|c: char| c.is_ascii_uppercase())
        && kind.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        return Ok(());
    }
    Err(CliError::usage_with_help(
        format!("Invalid kind '{kind}'"),
        "kinds are CamelCase identifiers, e.g. WebApp",
    ))
}

fn check_group(group: &str) -> Result<()> {
    let valid = group.contains('.')
        && !group.starts_with('.')
        && !group.ends_with('.')
        && group
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    if valid {
        return Ok(());
    }
    Err(CliError::usage_with_help(
        format!("Invalid API group '{group}'"),
        "API groups are lowercase DNS names, e.g. charts.example.com",
    ))
}

fn check_version(version: &str) -> Result<()> {
    let mut chars = version.chars();
    let valid = chars.next() == Some('v')
        && chars.next().is_some_and(|c| c.is_ascii_digit())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if valid {
        return Ok(());
    }
    Err(CliError::usage_with_help(
        format!("Invalid API version '{version}'"),
        "versions look like v1, v1beta1 or v2alpha3",
    ))
}
