//! Terminal rendering
//!
//! Findings for a values file, the inferred struct tree printed by
//! `inspect`, and CRD change analyses. Everything writes to a `Write` so the
//! output can be captured in tests.

use console::{Style, style};
use miaka_core::Schema;
use miaka_crd::{ChangeKind, ChangeSeverity, CrdAnalysis, CrdChange};
use std::io::{self, Write};

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One problem found in a values file
#[derive(Debug, Clone)]
pub struct Finding {
    pub severity: Severity,
    /// JSON pointer or dotted key path
    pub location: String,
    pub line: Option<usize>,
    pub message: String,
    pub hint: Option<String>,
}

impl Finding {
    pub fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, location.into(), message.into())
    }

    pub fn warning(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, location.into(), message.into())
    }

    fn new(severity: Severity, location: String, message: String) -> Self {
        Self {
            severity,
            location,
            line: None,
            message,
            hint: None,
        }
    }

    pub fn at_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Findings for one values file
#[derive(Debug)]
pub struct IssueReport {
    source: String,
    findings: Vec<Finding>,
}

impl IssueReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            findings: Vec::new(),
        }
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Counts as (errors, warnings)
    pub fn counts(&self) -> (usize, usize) {
        let errors = self
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        (errors, self.findings.len() - errors)
    }

    /// Source header, then one line per finding
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if self.findings.is_empty() {
            return Ok(());
        }

        writeln!(w)?;
        writeln!(w, "{}", style(&self.source).cyan().bold())?;
        for finding in &self.findings {
            let icon = match finding.severity {
                Severity::Error => style("✗").red(),
                Severity::Warning => style("⚠").yellow(),
            };
            let position = match finding.line {
                Some(line) => format!("{}:{}", finding.location, line),
                None => finding.location.clone(),
            };
            writeln!(w, "  {} {} {}", icon, finding.message, style(position).dim())?;
            if let Some(hint) = &finding.hint {
                writeln!(w, "    {} {}", style("hint:").blue(), hint)?;
            }
        }
        Ok(())
    }

    pub fn write_summary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self.counts() {
            (0, 0) => writeln!(w, "{} Validation passed", style("✓").green().bold()),
            (0, warnings) => writeln!(
                w,
                "{} Validation passed with {}",
                style("⚠").yellow().bold(),
                pluralize(warnings, "warning", "warnings")
            ),
            (errors, _) => writeln!(
                w,
                "{} Validation failed: {}",
                style("✗").red().bold(),
                pluralize(errors, "error", "errors")
            ),
        }
    }
}

/// `1 error`, `2 errors`
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Schema Display
// ═══════════════════════════════════════════════════════════════════════════

/// Write every struct of a schema with its fields, docs and markers
pub fn write_schema(w: &mut dyn Write, schema: &Schema) -> io::Result<()> {
    let api_version = if schema.api_group_version.is_empty() {
        String::new()
    } else {
        format!(" ({})", schema.api_group_version)
    };
    writeln!(
        w,
        "Schema: {}{}",
        style(&schema.resource_kind).cyan().bold(),
        api_version
    )?;
    writeln!(w, "{}", "═".repeat(66))?;

    for def in &schema.structs {
        writeln!(w)?;
        writeln!(w, "{}", style(&def.name).bold())?;
        for line in &def.documentation {
            writeln!(w, "  {}", style(format!("# {line}")).dim())?;
        }
        if def.fields.is_empty() {
            writeln!(w, "  {}", style("(free-form object)").dim())?;
        }

        for field in &def.fields {
            let type_name = field.field_type.to_string();
            let type_name = if field.is_unknown() {
                style(type_name).yellow()
            } else {
                style(type_name).green()
            };
            writeln!(w, "  {}: {}", field.source_key, type_name)?;

            for line in &field.documentation {
                writeln!(w, "      {}", style(format!("# {line}")).dim())?;
            }
            for marker in &field.markers {
                writeln!(w, "      {}", style(marker).blue())?;
            }
        }
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// CRD Diff Display
// ═══════════════════════════════════════════════════════════════════════════

/// Section headings, in display order
const CATEGORIES: [&str; 3] = ["Versions", "Schema Changes", "Other Changes"];

fn category(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::AddVersion | ChangeKind::RemoveVersion | ChangeKind::ChangeStorageVersion => {
            CATEGORIES[0]
        }
        ChangeKind::ChangeScope
        | ChangeKind::ChangeGroup
        | ChangeKind::ChangeKindName
        | ChangeKind::AddShortName
        | ChangeKind::RemoveShortName
        | ChangeKind::AddCategory => CATEGORIES[2],
        _ => CATEGORIES[1],
    }
}

/// Renderer for CRD change analysis
pub struct CrdDiffRenderer {
    writer: Box<dyn Write>,
}

impl Default for CrdDiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl CrdDiffRenderer {
    /// Create a new renderer that writes to stderr
    pub fn new() -> Self {
        Self {
            writer: Box::new(io::stderr()),
        }
    }

    /// Create a renderer that writes to a custom writer
    pub fn with_writer<W: Write + 'static>(writer: W) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    /// Render a CRD analysis to the terminal
    pub fn render(&mut self, analysis: &CrdAnalysis) -> io::Result<()> {
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "CRD Analysis: {}",
            style(&analysis.crd_name).cyan().bold()
        )?;
        writeln!(self.writer, "{}", "═".repeat(66))?;

        if analysis.is_new {
            writeln!(
                self.writer,
                "  {} New CRD - will be created",
                style("✓").green()
            )?;
            return Ok(());
        }

        if analysis.changes.is_empty() {
            writeln!(self.writer, "  {} No changes detected", style("✓").green())?;
            return Ok(());
        }

        for heading in CATEGORIES {
            let changes: Vec<_> = analysis
                .changes
                .iter()
                .filter(|c| category(c.kind) == heading)
                .collect();
            if changes.is_empty() {
                continue;
            }

            writeln!(self.writer)?;
            writeln!(self.writer, "{}:", style(heading).bold())?;
            for change in changes {
                self.render_change(change)?;
            }
        }

        self.render_summary(analysis)
    }

    fn render_change(&mut self, change: &CrdChange) -> io::Result<()> {
        let (icon, color) = severity_style(change.severity());

        writeln!(
            self.writer,
            "  {} {} {}",
            color.apply_to(icon),
            color.apply_to(change.prefix()),
            change.message
        )?;

        if let (Some(old), Some(new)) = (&change.old_value, &change.new_value) {
            writeln!(
                self.writer,
                "      {} → {}",
                style(old).dim(),
                style(new).bold()
            )?;
        }

        Ok(())
    }

    fn render_summary(&mut self, analysis: &CrdAnalysis) -> io::Result<()> {
        let (safe, warn, danger) = analysis.count_by_severity();

        writeln!(self.writer)?;
        writeln!(self.writer, "{}", "─".repeat(66))?;
        writeln!(self.writer, "{}:", style("Summary").bold())?;

        if safe > 0 {
            writeln!(
                self.writer,
                "  {} {}",
                style("✓").green(),
                pluralize(safe, "safe change", "safe changes")
            )?;
        }
        if warn > 0 {
            writeln!(
                self.writer,
                "  {} {}",
                style("⚠").yellow(),
                pluralize(warn, "warning", "warnings")
            )?;
        }
        if danger > 0 {
            writeln!(
                self.writer,
                "  {} {}",
                style("✗").red(),
                pluralize(danger, "dangerous change", "dangerous changes")
            )?;
        }

        writeln!(self.writer, "{}", "─".repeat(66))?;

        Ok(())
    }
}

/// Get style for a severity level
fn severity_style(severity: ChangeSeverity) -> (&'static str, Style) {
    match severity {
        ChangeSeverity::Safe => ("✓", Style::new().green()),
        ChangeSeverity::Warning => ("⚠", Style::new().yellow()),
        ChangeSeverity::Dangerous => ("✗", Style::new().red()),
    }
}
