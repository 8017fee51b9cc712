//! Builds the outbound chat payload from host history and attachments.
use crate::api::public::{ChatRequestPayload, ConversationTurn, FileAttachment};

use super::models::{HostTurn, HostTurnKind, ResponsePart};

/// Convert the host's history into conversation turns for the
/// service. Turns from other participants sharing the chat surface
/// are dropped and order is preserved.
pub fn build_history(history: &[HostTurn], participant_id: &str) -> Vec<ConversationTurn> {
    history
        .iter()
        .filter(|turn| turn.participant == participant_id)
        .map(|turn| match &turn.kind {
            HostTurnKind::Request { prompt } => ConversationTurn::Human {
                content: prompt.clone(),
            },
            HostTurnKind::Response { parts } => ConversationTurn::Ai {
                content: markdown_content(parts),
            },
        })
        .collect()
}

/// Only markdown is kept from a previous response, concatenated
/// without a separator.
fn markdown_content(parts: &[ResponsePart]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            ResponsePart::Markdown(md) => Some(md.as_str()),
            ResponsePart::Other { .. } => None,
        })
        .collect()
}

/// Assemble the request payload, leaving out `history` and `files`
/// when there is nothing to send.
pub fn build_payload(
    message: &str,
    history: Vec<ConversationTurn>,
    files: Vec<FileAttachment>,
) -> ChatRequestPayload {
    ChatRequestPayload {
        message: message.to_string(),
        history: if history.is_empty() {
            None
        } else {
            Some(history)
        },
        files: if files.is_empty() { None } else { Some(files) },
    }
}
