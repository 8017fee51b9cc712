mod client;
pub use client::{ApiClient, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT, RemoteService};
mod error;
pub use error::ApiClientError;
pub mod public;
