//! CLI commands

pub mod diff;
pub mod generate;
pub mod init;
pub mod inspect;
pub mod validate;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use crate::error::{CliError, Result};

pub(crate) fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CliError::io_at(path, e))
}

/// Write `contents`, creating parent directories as needed
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CliError::io_at(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| CliError::io_at(path, e))
}

/// Parse a YAML (or JSON) file into a JSON value
pub(crate) fn read_document(path: &Path) -> Result<serde_json::Value> {
    let text = read_file(path)?;
    serde_yaml::from_str(&text).map_err(|e| {
        CliError::usage_with_help(
            format!("{} is not valid YAML or JSON: {}", path.display(), e),
            "pass a single YAML or JSON document",
        )
    })
}

/// Both stdin and stderr are attached to a terminal
pub(crate) fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && Term::stderr().is_term()
}

/// Ask for a value on stderr, falling back to `default` on an empty answer
pub(crate) fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    let term = Term::stderr();
    let question = match default {
        Some(default) => format!("{label} [{default}]: "),
        None => format!("{label}: "),
    };

    loop {
        term.write_str(&question)?;
        let answer = term.read_line()?;
        let answer = answer.trim();
        match (answer.is_empty(), default) {
            (false, _) => return Ok(answer.to_string()),
            (true, Some(default)) => return Ok(default.to_string()),
            (true, None) => continue,
        }
    }
}

/// Ask a yes/no question, defaulting to no
pub(crate) fn confirm(question: &str) -> Result<bool> {
    let term = Term::stderr();
    term.write_str(&format!("{question} [y/N]: "))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Spinner on stderr, hidden when stderr is not a terminal
pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crds").join("demos.example.com.yaml");

        write_file(&path, "kind: CustomResourceDefinition\n").unwrap();
        assert_eq!(read_file(&path).unwrap(), "kind: CustomResourceDefinition\n");
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_file(Path::new("does/not/exist.yaml")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }

    #[test]
    fn test_read_document_accepts_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{"type": "object"}"#).unwrap();

        assert_eq!(
            read_document(&path).unwrap(),
            serde_json::json!({"type": "object"})
        );
    }
}
