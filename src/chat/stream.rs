use tokio::sync::mpsc;

/// A chunk of output for the host's chat surface.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamPart {
    /// Interim status, replaced or hidden once the turn completes
    Progress(String),
    /// Content that stays in the transcript
    Markdown(String),
}

/// Incremental output for a single chat turn. Parts are forwarded
/// through a channel to whatever renders them.
#[derive(Clone, Debug)]
pub struct ChatResponseStream {
    tx: mpsc::UnboundedSender<StreamPart>,
}

impl ChatResponseStream {
    pub fn new(tx: mpsc::UnboundedSender<StreamPart>) -> Self {
        Self { tx }
    }

    /// Create a stream along with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamPart>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn progress(&self, msg: impl Into<String>) {
        // The result is ignored because the turn should complete even
        // if nobody is listening anymore
        let _ = self.tx.send(StreamPart::Progress(msg.into()));
    }

    pub fn markdown(&self, msg: impl Into<String>) {
        let _ = self.tx.send(StreamPart::Markdown(msg.into()));
    }
}

/// Drain everything currently buffered in `rx`.
pub fn collect_parts(rx: &mut mpsc::UnboundedReceiver<StreamPart>) -> Vec<StreamPart> {
    let mut parts = Vec::new();
    while let Ok(part) = rx.try_recv() {
        parts.push(part);
    }
    parts
}
