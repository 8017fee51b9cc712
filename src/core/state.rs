//! Per-workspace state that outlives a single chat turn.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const STATE_DIR: &str = ".aristotle";
const STATE_FILE: &str = "state.json";

/// Session identity handed to the orchestrator on every turn and
/// handed back when the turn completes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThreadContext {
    pub thread_id: Option<String>,
}

/// Key-value state persisted as JSON under the workspace root.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl WorkspaceState {
    pub fn path(workspace_root: &Path) -> PathBuf {
        workspace_root.join(STATE_DIR).join(STATE_FILE)
    }

    /// Load the state for a workspace. A workspace that has never
    /// saved any state starts out empty.
    pub async fn load(workspace_root: &Path) -> Result<Self> {
        let path = Self::path(workspace_root);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        serde_json::from_str(&raw).with_context(|| format!("Invalid state in {}", path.display()))
    }

    pub async fn save(&self, workspace_root: &Path) -> Result<()> {
        let path = Self::path(workspace_root);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, raw)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn thread_context(&self) -> ThreadContext {
        ThreadContext {
            thread_id: self.thread_id.clone(),
        }
    }

    pub fn update_thread_id(&mut self, ctx: &ThreadContext) {
        self.thread_id = ctx.thread_id.clone();
    }
}
