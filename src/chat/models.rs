//! Host-side representations of a chat turn. The integration layer
//! translates whatever the editor hands it into these types so the
//! rest of the crate never deals with host specifics.
use crate::workspace::FileReference;

/// One segment of a previous assistant response.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponsePart {
    Markdown(String),
    /// Anything that isn't rendered markdown e.g. a tool invocation,
    /// a button or a file tree
    Other { kind: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum HostTurnKind {
    Request { prompt: String },
    Response { parts: Vec<ResponsePart> },
}

/// A single turn of the host's chat history, tagged with the
/// participant that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct HostTurn {
    pub participant: String,
    pub kind: HostTurnKind,
}

impl HostTurn {
    pub fn request(participant: &str, prompt: &str) -> Self {
        Self {
            participant: participant.to_string(),
            kind: HostTurnKind::Request {
                prompt: prompt.to_string(),
            },
        }
    }

    pub fn response(participant: &str, parts: Vec<ResponsePart>) -> Self {
        Self {
            participant: participant.to_string(),
            kind: HostTurnKind::Response { parts },
        }
    }
}

/// The user's input for the current turn.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatRequest {
    pub prompt: String,
    pub references: Vec<FileReference>,
}

impl ChatRequest {
    pub fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<FileReference>) -> Self {
        self.references = references;
        self
    }
}

/// Everything the host knows about the conversation so far, in
/// chronological order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatContext {
    pub history: Vec<HostTurn>,
}
