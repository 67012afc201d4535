//! Implements ArtifactPort on the local filesystem.
//!
//! Every write goes through a temp file, `sync_all`, then rename, so a crash
//! never leaves a half-written stage output behind.

use crate::domain::DomainError;
use crate::ports::ArtifactPort;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    /// Store writing directly into `dir`. Created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Store for one run: `<output_dir>/run_<YYYYMMDD_HHMMSS>`.
    pub fn for_run(output_dir: impl AsRef<Path>, started: DateTime<Local>) -> Self {
        Self::new(run_dir(output_dir.as_ref(), started))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn write_atomic(&self, name: &str, contents: &[u8]) -> Result<PathBuf, DomainError> {
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(DomainError::Artifact(format!("invalid artifact name: {:?}", name)));
        }
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DomainError::Artifact(format!("create {}: {}", self.dir.display(), e)))?;

        let path = self.dir.join(name);
        let temp_path = self.dir.join(format!(".{}.tmp", name));
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::Artifact(format!("create temp file: {}", e)))?;
        f.write_all(contents)
            .await
            .map_err(|e| DomainError::Artifact(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::Artifact(format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| DomainError::Artifact(format!("atomic rename failed: {}", e)))?;

        info!(path = %path.display(), bytes = contents.len(), "artifact written");
        Ok(path)
    }
}

pub fn run_dir(output_dir: &Path, started: DateTime<Local>) -> PathBuf {
    output_dir.join(format!("run_{}", started.format("%Y%m%d_%H%M%S")))
}

#[async_trait::async_trait]
impl ArtifactPort for FsArtifactStore {
    async fn write_lines(&self, name: &str, lines: &[String]) -> Result<PathBuf, DomainError> {
        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        self.write_atomic(name, text.as_bytes()).await
    }

    async fn write_text(&self, name: &str, text: &str) -> Result<PathBuf, DomainError> {
        self.write_atomic(name, text.as_bytes()).await
    }

    async fn write_json(
        &self,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<PathBuf, DomainError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| DomainError::Artifact(e.to_string()))?;
        self.write_atomic(name, json.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_write_lines_creates_dir_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(tmp.path().join("nested"));
        let lines = vec!["A binds B <--> A_B".to_string(), "A_B is degraded".to_string()];
        let path = store.write_lines("final_equations.txt", &lines).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "A binds B <--> A_B\nA_B is degraded\n");
        assert!(!tmp.path().join("nested/.final_equations.txt.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_json_pretty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(tmp.path());
        let value = serde_json::json!({"source": ["EGF"], "sink": ["ERK_p"]});
        let path = store.write_json("terminal_nodes.json", &value).await.unwrap();

        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, value);
    }

    #[tokio::test]
    async fn test_rejects_path_like_names() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(tmp.path());
        assert!(store.write_text("../escape.txt", "x").await.is_err());
        assert!(store.write_text("", "x").await.is_err());
    }

    #[test]
    fn test_run_dir_name() {
        let started = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            run_dir(Path::new("out"), started),
            PathBuf::from("out/run_20250102_030405")
        );
    }
}
