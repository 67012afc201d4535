//! Stage input files: equation lists, free text, JSON documents.

use crate::domain::DomainError;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs;

pub async fn read_text(path: &Path) -> Result<String, DomainError> {
    fs::read_to_string(path)
        .await
        .map_err(|e| DomainError::Input(format!("{}: {}", path.display(), e)))
}

/// Non-blank lines, trimmed.
pub async fn read_equations(path: &Path) -> Result<Vec<String>, DomainError> {
    Ok(read_text(path)
        .await?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DomainError> {
    let text = read_text(path).await?;
    serde_json::from_str(&text)
        .map_err(|e| DomainError::Input(format!("{}: invalid JSON: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TerminalNodes;

    #[tokio::test]
    async fn test_read_equations_skips_blank_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("eq.txt");
        std::fs::write(&path, "A activates B\n\n  B is degraded  \n").unwrap();
        let eqs = read_equations(&path).await.unwrap();
        assert_eq!(eqs, vec!["A activates B", "B is degraded"]);
    }

    #[tokio::test]
    async fn test_read_json_and_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("terminal.json");
        std::fs::write(&path, r#"{"source": ["EGF"], "sink": ["ERK_p"]}"#).unwrap();
        let nodes: TerminalNodes = read_json(&path).await.unwrap();
        assert_eq!(nodes.sink, vec!["ERK_p"]);

        let missing = read_text(&tmp.path().join("nope.txt")).await;
        assert!(matches!(missing, Err(DomainError::Input(_))));
    }
}
