use std::path::PathBuf;

use anyhow::{Context, Result};

use super::host::TerminalHost;
use crate::core::AppConfig;
use crate::workspace::FileReference;

pub async fn run(
    config: &AppConfig,
    workspace_root: PathBuf,
    prompt: &str,
    files: Vec<PathBuf>,
) -> Result<()> {
    let mut references = Vec::new();
    for file in files {
        let path = std::path::absolute(&file)
            .with_context(|| format!("Invalid file path {}", file.display()))?;
        references.push(FileReference::local(path));
    }

    let mut host = TerminalHost::new(config, workspace_root).await?;
    host.turn(prompt, references).await
}
