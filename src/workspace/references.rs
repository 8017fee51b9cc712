use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::api::public::FileAttachment;
use crate::chat::ChatResponseStream;

pub const FILE_SCHEME: &str = "file";

/// Instructions file generated by the host. It isn't authored project
/// content so it is never sent to the service.
pub const SYNTHETIC_INSTRUCTIONS_MARKER: &str = "copilot-instructions.md";

#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceUri {
    pub scheme: String,
    pub path: PathBuf,
}

/// A resource the user attached to a chat turn.
#[derive(Clone, Debug, PartialEq)]
pub struct FileReference {
    /// Stable identity, the same file attached twice shares an id
    pub id: String,
    /// Display name shown by the host
    pub name: String,
    pub uri: Option<ReferenceUri>,
}

impl FileReference {
    /// Reference to a file on the local disk.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: format!("file:{}", path.display()),
            name,
            uri: Some(ReferenceUri {
                scheme: FILE_SCHEME.to_string(),
                path,
            }),
        }
    }
}

/// Eligibility rule shared by attachments and bulk loading: only
/// local files, never the host's synthetic instructions file.
pub fn is_eligible(scheme: &str, display_name: &str) -> bool {
    scheme == FILE_SCHEME && !display_name.contains(SYNTHETIC_INSTRUCTIONS_MARKER)
}

/// Read a file as UTF-8 text. Invalid sequences are replaced rather
/// than rejected.
pub async fn read_text(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read every eligible reference into an attachment. Files that
/// can't be read are logged and left out, repeated references are
/// read once. Cancellation is checked before each read and stops any
/// further reads.
pub async fn resolve_attachments(
    references: &[FileReference],
    stream: &ChatResponseStream,
    token: &CancellationToken,
) -> Vec<FileAttachment> {
    let mut attachments = Vec::new();
    let mut seen = HashSet::new();

    for reference in references {
        let Some(uri) = &reference.uri else {
            tracing::debug!("Skipping reference {} without a uri", reference.id);
            continue;
        };
        if !is_eligible(&uri.scheme, &reference.name) {
            tracing::debug!("Skipping ineligible reference {}", reference.id);
            continue;
        }
        if !seen.insert(reference.id.as_str()) {
            tracing::debug!("Skipping repeated reference {}", reference.id);
            continue;
        }
        if token.is_cancelled() {
            tracing::info!("Cancelled while reading context files");
            break;
        }

        stream.progress(format!("Reading context file {}...", reference.name));

        match read_text(&uri.path).await {
            Ok(content) => attachments.push(FileAttachment {
                content,
                file_name: reference.name.clone(),
                reference: uri.path.display().to_string(),
            }),
            Err(e) => {
                tracing::error!("Error reading file {}: {:#}", reference.id, e);
            }
        }
    }

    if !attachments.is_empty() {
        stream.progress("Working on it...");
    }

    attachments
}
