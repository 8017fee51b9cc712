pub mod config;
pub use config::AppConfig;
pub mod state;
pub use state::{ThreadContext, WorkspaceState};
