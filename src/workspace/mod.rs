pub mod loader;
pub use loader::{
    BatchSummary, BulkLoader, FileMatcher, FileOutcome, LoadReport, LoadStatus, UploadOutcome,
};
pub mod references;
pub use references::{FileReference, ReferenceUri, is_eligible, resolve_attachments};
