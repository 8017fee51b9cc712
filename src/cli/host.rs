//! Terminal stand-in for the editor: owns the conversation history,
//! renders the response stream and persists workspace state.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::chat::{
    ChatContext, ChatHandler, ChatRequest, ChatResponseStream, HostTurn, ResponsePart, StreamPart,
};
use crate::core::{AppConfig, WorkspaceState};
use crate::workspace::FileReference;

const FILE_MENTION_PREFIX: &str = "#file:";

pub struct TerminalHost {
    handler: ChatHandler,
    participant_id: String,
    workspace_root: PathBuf,
    state: WorkspaceState,
    context: ChatContext,
}

impl TerminalHost {
    pub async fn new(config: &AppConfig, workspace_root: PathBuf) -> Result<Self> {
        let client = ApiClient::new(&config.api_base_url, config.request_timeout);
        tracing::info!("Using service at {}", client.base_url());
        let handler = ChatHandler::from_config(Arc::new(client), config, Some(workspace_root.clone()))?;
        let state = WorkspaceState::load(&workspace_root).await?;

        Ok(Self {
            handler,
            participant_id: config.participant_id.clone(),
            workspace_root,
            state,
            context: ChatContext::default(),
        })
    }

    /// Run a single turn, printing progress to stderr and markdown to
    /// stdout. Ctrl-C cancels the turn rather than the process.
    pub async fn turn(&mut self, prompt: &str, mut references: Vec<FileReference>) -> Result<()> {
        references.extend(parse_file_mentions(prompt, &self.workspace_root));
        let request = ChatRequest::new(prompt).with_references(references);

        let token = CancellationToken::new();
        let ctrl_c_token = token.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Cancelling current turn");
                ctrl_c_token.cancel();
            }
        });

        let (stream, mut rx) = ChatResponseStream::channel();
        let renderer = tokio::spawn(async move {
            let mut parts = Vec::new();
            while let Some(part) = rx.recv().await {
                match part {
                    StreamPart::Progress(msg) => {
                        eprintln!("{}", msg);
                        parts.push(ResponsePart::Other {
                            kind: String::from("progress"),
                        });
                    }
                    StreamPart::Markdown(md) => {
                        println!("{}", md);
                        parts.push(ResponsePart::Markdown(md));
                    }
                }
            }
            parts
        });

        let thread = self
            .handler
            .handle(
                self.state.thread_context(),
                &request,
                &self.context,
                &stream,
                &token,
            )
            .await;
        ctrl_c.abort();

        // Closing the stream lets the renderer finish
        drop(stream);
        let parts = renderer.await?;

        self.context
            .history
            .push(HostTurn::request(&self.participant_id, prompt));
        self.context
            .history
            .push(HostTurn::response(&self.participant_id, parts));

        self.state.update_thread_id(&thread);
        self.state.save(&self.workspace_root).await?;

        Ok(())
    }
}

/// Collect `#file:<path>` mentions from a prompt. Relative paths are
/// resolved against the workspace root.
pub fn parse_file_mentions(prompt: &str, workspace_root: &Path) -> Vec<FileReference> {
    prompt
        .split_whitespace()
        .filter_map(|token| token.strip_prefix(FILE_MENTION_PREFIX))
        .filter(|path| !path.is_empty())
        .map(|path| {
            let path = Path::new(path);
            if path.is_absolute() {
                FileReference::local(path)
            } else {
                FileReference::local(workspace_root.join(path))
            }
        })
        .collect()
}
