use std::path::PathBuf;

use anyhow::Result;

use super::host::TerminalHost;
use crate::chat::LOAD_WORKSPACE_COMMAND;
use crate::core::AppConfig;

pub async fn run(config: &AppConfig, workspace_root: PathBuf, codebase_name: &str) -> Result<()> {
    let mut host = TerminalHost::new(config, workspace_root).await?;
    let prompt = format!("{} {}", LOAD_WORKSPACE_COMMAND, codebase_name);
    host.turn(&prompt, Vec::new()).await
}
