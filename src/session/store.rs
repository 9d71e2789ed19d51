//! File-backed session store
//!
//! Layout: `<directory>/<target>_state.json`. Writes are atomic (temp file,
//! then rename) so a crash never leaves a half-written snapshot. Callers
//! hold the target's registry lock around writes.

use super::state::SessionState;
use crate::core::error::PublishError;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_SUFFIX: &str = "_state.json";

#[derive(Debug, Clone)]
pub struct SessionStore {
    directory: PathBuf,
}

impl SessionStore {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File path holding `target`'s snapshot
    pub fn path_for(&self, target: &str) -> PathBuf {
        let safe: String = target
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.directory.join(format!("{}{}", safe, STATE_SUFFIX))
    }

    /// Load a target's snapshot.
    ///
    /// Returns `Ok(None)` when the file is missing or holds no cookies.
    pub async fn load(&self, target: &str) -> Result<Option<SessionState>, PublishError> {
        let path = self.path_for(target);
        if fs::metadata(&path).await.is_err() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| session_error(target, format!("读取 {} 失败: {}", path.display(), e)))?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let state: SessionState = serde_json::from_str(&content)
            .map_err(|e| session_error(target, format!("文件已损坏: {}", e)))?;

        Ok(state.is_authenticated().then_some(state))
    }

    /// Overwrite a target's snapshot (atomic operation)
    pub async fn save(&self, target: &str, state: &SessionState) -> Result<(), PublishError> {
        fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| session_error(target, e.to_string()))?;

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| session_error(target, e.to_string()))?;

        let path = self.path_for(target);
        let temp_file = path.with_extension("json.tmp");
        fs::write(&temp_file, json)
            .await
            .map_err(|e| session_error(target, e.to_string()))?;
        fs::rename(&temp_file, &path)
            .await
            .map_err(|e| session_error(target, e.to_string()))?;

        tracing::info!(
            platform = target,
            cookies = state.cookies.len(),
            path = %path.display(),
            "login state saved"
        );

        Ok(())
    }

    /// Logged in means a readable snapshot with at least one cookie
    pub async fn is_logged_in(&self, target: &str) -> bool {
        matches!(self.load(target).await, Ok(Some(_)))
    }

    /// Remove a target's snapshot if it exists
    pub async fn clear(&self, target: &str) -> Result<(), PublishError> {
        let path = self.path_for(target);
        if fs::metadata(&path).await.is_ok() {
            fs::remove_file(&path)
                .await
                .map_err(|e| session_error(target, e.to_string()))?;
        }
        Ok(())
    }
}

fn session_error(target: &str, message: String) -> PublishError {
    PublishError::Session {
        target: target.to_string(),
        message,
    }
}
