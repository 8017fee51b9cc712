use std::path::PathBuf;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use super::host::TerminalHost;
use crate::core::AppConfig;

pub async fn run(config: &AppConfig, workspace_root: PathBuf) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut host = TerminalHost::new(config, workspace_root).await?;

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                host.turn(&line, Vec::new()).await?;
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
