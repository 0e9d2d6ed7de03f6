//! Compatibility policies
//!
//! Decide whether a regenerated CRD may replace the previous one, based on
//! the severities found by the analyzer.

use serde::{Deserialize, Serialize};

use crate::analyzer::{ChangeSeverity, CrdAnalysis};

/// Outcome of applying a policy to an analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompatibilityDecision {
    Accept,
    Reject {
        reason: String,
        /// Messages of the changes that caused the rejection
        blocking_changes: Vec<String>,
    },
}

impl CompatibilityDecision {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Reject { .. })
    }

    pub fn blocking_messages(&self) -> Option<&[String]> {
        match self {
            Self::Reject {
                blocking_changes, ..
            } => Some(blocking_changes),
            Self::Accept => None,
        }
    }
}

pub trait CompatibilityStrategy: Send + Sync {
    fn decide(&self, analysis: &CrdAnalysis) -> CompatibilityDecision;

    fn name(&self) -> &'static str;
}

/// Reject every change at or above `threshold`
fn reject_from(analysis: &CrdAnalysis, threshold: ChangeSeverity) -> CompatibilityDecision {
    if analysis.is_new {
        return CompatibilityDecision::Accept;
    }

    let blocking: Vec<String> = analysis
        .changes
        .iter()
        .filter(|c| c.severity() >= threshold)
        .map(|c| c.message.clone())
        .collect();

    if blocking.is_empty() {
        return CompatibilityDecision::Accept;
    }

    CompatibilityDecision::Reject {
        reason: format!(
            "{} {} change(s) detected",
            blocking.len(),
            match threshold {
                ChangeSeverity::Dangerous => "dangerous",
                _ => "breaking or risky",
            }
        ),
        blocking_changes: blocking,
    }
}

/// Rejects dangerous changes
#[derive(Debug, Default, Clone, Copy)]
pub struct SafeStrategy;

impl CompatibilityStrategy for SafeStrategy {
    fn decide(&self, analysis: &CrdAnalysis) -> CompatibilityDecision {
        reject_from(analysis, ChangeSeverity::Dangerous)
    }

    fn name(&self) -> &'static str {
        "safe"
    }
}

/// Rejects warnings and dangerous changes
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictStrategy;

impl CompatibilityStrategy for StrictStrategy {
    fn decide(&self, analysis: &CrdAnalysis) -> CompatibilityDecision {
        reject_from(analysis, ChangeSeverity::Warning)
    }

    fn name(&self) -> &'static str {
        "strict"
    }
}

/// Accepts everything
#[derive(Debug, Default, Clone, Copy)]
pub struct ForceStrategy;

impl CompatibilityStrategy for ForceStrategy {
    fn decide(&self, _analysis: &CrdAnalysis) -> CompatibilityDecision {
        CompatibilityDecision::Accept
    }

    fn name(&self) -> &'static str {
        "force"
    }
}

/// Policy as written in miaka.yaml or on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityPolicy {
    #[default]
    Safe,
    Strict,
    Force,
}

impl CompatibilityPolicy {
    pub fn strategy(self) -> Box<dyn CompatibilityStrategy> {
        match self {
            Self::Safe => Box::new(SafeStrategy),
            Self::Strict => Box::new(StrictStrategy),
            Self::Force => Box::new(ForceStrategy),
        }
    }

    pub fn decide(self, analysis: &CrdAnalysis) -> CompatibilityDecision {
        self.strategy().decide(analysis)
    }
}

impl std::str::FromStr for CompatibilityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "safe" => Ok(Self::Safe),
            "strict" => Ok(Self::Strict),
            "force" => Ok(Self::Force),
            other => Err(format!(
                "unknown policy '{}', expected safe, strict or force",
                other
            )),
        }
    }
}

impl std::fmt::Display for CompatibilityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.strategy().name())
    }
}
