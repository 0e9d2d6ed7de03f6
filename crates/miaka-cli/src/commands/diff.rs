//! Diff command - compare two CRD files

use console::style;
use miaka_crd::{CompatibilityDecision, CompatibilityPolicy, CrdAnalyzer, CrdParser};
use std::path::Path;

use crate::commands::read_file;
use crate::display::CrdDiffRenderer;
use crate::error::{CliError, Result};

pub fn run(old: &Path, new: &Path, policy: CompatibilityPolicy) -> Result<()> {
    let previous = CrdParser::parse(&read_file(old)?)?;
    let current = CrdParser::parse(&read_file(new)?)?;

    let analysis = CrdAnalyzer::analyze(Some(&previous), &current);
    CrdDiffRenderer::with_writer(std::io::stdout()).render(&analysis)?;

    match policy.decide(&analysis) {
        CompatibilityDecision::Accept => {
            println!();
            println!("{} Accepted by the {} policy", style("✓").green(), policy);
            Ok(())
        }
        CompatibilityDecision::Reject { reason, .. } => Err(CliError::BreakingChange { reason }),
    }
}
