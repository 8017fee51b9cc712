//! Entry point for a single user turn in the chat surface.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Error, Result};
use tokio_util::sync::CancellationToken;

use super::history::{build_history, build_payload};
use super::models::{ChatContext, ChatRequest};
use super::stream::ChatResponseStream;
use crate::api::{ApiClientError, RemoteService};
use crate::core::{AppConfig, ThreadContext};
use crate::workspace::{BulkLoader, resolve_attachments};

/// Prompt prefix that triggers a bulk load of the open workspace.
pub const LOAD_WORKSPACE_COMMAND: &str = "/load_cwd";

const USAGE_MESSAGE: &str =
    "❌ Invalid usage. Please provide exactly one argument: `/load_cwd <codebase_name>`";

#[derive(Debug, PartialEq)]
pub enum ParsedCommand<'a> {
    LoadWorkspace { codebase_name: &'a str },
    /// A reserved command with the wrong number of arguments
    Usage,
}

/// Returns `None` when the prompt is ordinary chat.
pub fn parse_command(prompt: &str) -> Option<ParsedCommand<'_>> {
    let parts: Vec<&str> = prompt.split_whitespace().collect();
    match parts.as_slice() {
        &[cmd, codebase_name] if cmd == LOAD_WORKSPACE_COMMAND => {
            Some(ParsedCommand::LoadWorkspace { codebase_name })
        }
        &[cmd, ..] if cmd == LOAD_WORKSPACE_COMMAND => Some(ParsedCommand::Usage),
        _ => None,
    }
}

pub fn format_references(references: &[String]) -> String {
    let items = references
        .iter()
        .map(|r| format!("- {}", r))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\n**References:**\n{}", items)
}

/// User facing text for a failed turn. Errors from the service show
/// the service's own message.
fn error_message(err: &Error) -> String {
    match err.downcast_ref::<ApiClientError>() {
        Some(api_err) => api_err.message(),
        None => format!("{:#}", err),
    }
}

/// Handles chat turns for one workspace. Either dispatches a command
/// or sends the prompt, history and attachments to the service.
pub struct ChatHandler {
    service: Arc<dyn RemoteService>,
    loader: BulkLoader,
    participant_id: String,
    workspace_root: Option<PathBuf>,
}

impl ChatHandler {
    pub fn new(
        service: Arc<dyn RemoteService>,
        loader: BulkLoader,
        participant_id: &str,
        workspace_root: Option<PathBuf>,
    ) -> Self {
        Self {
            service,
            loader,
            participant_id: participant_id.to_string(),
            workspace_root,
        }
    }

    pub fn from_config(
        service: Arc<dyn RemoteService>,
        config: &AppConfig,
        workspace_root: Option<PathBuf>,
    ) -> Result<Self> {
        let loader = BulkLoader::from_config(service.clone(), config)?;
        Ok(Self::new(
            service,
            loader,
            &config.participant_id,
            workspace_root,
        ))
    }

    /// Run one turn. All output goes to `stream` and no error escapes
    /// this function. The thread context is handed back for the host
    /// to persist.
    pub async fn handle(
        &self,
        thread: ThreadContext,
        request: &ChatRequest,
        context: &ChatContext,
        stream: &ChatResponseStream,
        token: &CancellationToken,
    ) -> ThreadContext {
        stream.progress("Working on it...");
        tracing::debug!("Handling turn with thread id {:?}", thread.thread_id);

        match parse_command(&request.prompt) {
            Some(ParsedCommand::LoadWorkspace { codebase_name }) => {
                let result = self
                    .loader
                    .load_workspace(self.workspace_root.as_deref(), codebase_name, stream, token)
                    .await;
                if let Err(e) = result {
                    tracing::error!("Loading codebase {} failed: {:#}", codebase_name, e);
                    stream.markdown(format!("❌ Error loading codebase: {}", error_message(&e)));
                }
                return thread;
            }
            Some(ParsedCommand::Usage) => {
                stream.markdown(USAGE_MESSAGE);
                return thread;
            }
            None => {}
        }

        if let Err(e) = self.ask(request, context, stream, token).await {
            tracing::error!("Chat request failed: {:#}", e);
            stream.markdown(format!("❌ Error while asking: {}", error_message(&e)));
        }

        thread
    }

    async fn ask(
        &self,
        request: &ChatRequest,
        context: &ChatContext,
        stream: &ChatResponseStream,
        token: &CancellationToken,
    ) -> Result<()> {
        let history = build_history(&context.history, &self.participant_id);
        let files = resolve_attachments(&request.references, stream, token).await;
        let payload = build_payload(&request.prompt, history, files);

        tracing::info!(
            "Sending chat request with {} history turns and {} files",
            payload.history.as_ref().map_or(0, |h| h.len()),
            payload.files.as_ref().map_or(0, |f| f.len())
        );
        let response = self.service.send_chat(&payload).await?;

        // TODO: Persist `thread_id` once the service documents how
        // sessions are meant to be resumed
        if !response.thread_id.is_empty() {
            tracing::debug!("Service responded on thread {}", response.thread_id);
        }

        if response.response.is_empty() {
            stream.markdown("❌ No response from server.");
            return Ok(());
        }

        stream.markdown(response.response);
        if !response.references.is_empty() {
            stream.markdown(format_references(&response.references));
        }

        Ok(())
    }
}
