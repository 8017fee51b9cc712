//! Test utilities for integration tests
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use aristotle::api::ApiClient;
use aristotle::chat::{
    ChatContext, ChatHandler, ChatRequest, ChatResponseStream, StreamPart, collect_parts,
};
use aristotle::core::{AppConfig, ThreadContext};

/// Config pointed at a mock server with the default file rules.
pub fn test_config(api_base_url: &str) -> AppConfig {
    AppConfig {
        api_base_url: api_base_url.to_string(),
        request_timeout: aristotle::api::DEFAULT_REQUEST_TIMEOUT,
        max_concurrency: 4,
        include_extensions: vec![String::from("py"), String::from("md")],
        exclude_dirs: vec![String::from("node_modules"), String::from(".venv")],
        participant_id: String::from("aristotle-ui.chat"),
    }
}

pub fn test_handler(api_base_url: &str, workspace_root: Option<PathBuf>) -> ChatHandler {
    let config = test_config(api_base_url);
    let client = ApiClient::new(&config.api_base_url, config.request_timeout);
    ChatHandler::from_config(Arc::new(client), &config, workspace_root)
        .expect("Failed to build chat handler")
}

/// Run a single turn and return everything written to the stream.
pub async fn run_turn(
    handler: &ChatHandler,
    request: ChatRequest,
    context: ChatContext,
) -> Vec<StreamPart> {
    let (stream, mut rx) = ChatResponseStream::channel();
    handler
        .handle(
            ThreadContext::default(),
            &request,
            &context,
            &stream,
            &CancellationToken::new(),
        )
        .await;
    collect_parts(&mut rx)
}

pub fn markdown(parts: &[StreamPart]) -> Vec<String> {
    parts
        .iter()
        .filter_map(|p| match p {
            StreamPart::Markdown(md) => Some(md.clone()),
            StreamPart::Progress(_) => None,
        })
        .collect()
}

pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}
