//! Public API types shared with the remote service

use serde::{Deserialize, Deserializer, Serialize};

/// A single turn of conversation history in the shape the service
/// expects: `{"type": "HUMAN_MESSAGE", "content": "..."}`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ConversationTurn {
    #[serde(rename = "HUMAN_MESSAGE")]
    Human { content: String },
    #[serde(rename = "AI_MESSAGE")]
    Ai { content: String },
}

impl ConversationTurn {
    pub fn content(&self) -> &str {
        match self {
            ConversationTurn::Human { content } | ConversationTurn::Ai { content } => content,
        }
    }
}

/// Contents of a file the user attached to a chat turn.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct FileAttachment {
    pub content: String,
    pub file_name: String,
    /// Absolute path of the file on disk
    pub reference: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ChatRequestPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<ConversationTurn>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileAttachment>>,
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct ChatResponsePayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub response: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub references: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thread_id: String,
}

/// The service sends `null` for fields it has nothing to say about
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct UploadFileRequest {
    pub codebase_name: String,
    /// Path relative to the workspace root
    pub file_path: String,
    pub file_content: String,
}

/// Body returned by the service alongside a non-2xx status. The
/// `error` field is optional.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    pub error: Option<String>,
}
