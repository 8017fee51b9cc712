pub mod history;
pub use history::{build_history, build_payload};
pub mod models;
pub use models::{ChatContext, ChatRequest, HostTurn, HostTurnKind, ResponsePart};
pub mod orchestrator;
pub use orchestrator::{ChatHandler, LOAD_WORKSPACE_COMMAND, parse_command};
mod stream;
pub use stream::{ChatResponseStream, StreamPart, collect_parts};
