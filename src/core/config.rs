use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::api::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT};

/// Chat participant id used by the editor integration. Only history
/// turns tagged with this id are sent back to the service.
pub const DEFAULT_PARTICIPANT_ID: &str = "aristotle-ui.chat";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub max_concurrency: usize,
    pub include_extensions: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub participant_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api_base_url = env::var("ARISTOTLE_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let request_timeout = parse_env::<u64>("ARISTOTLE_REQUEST_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let max_concurrency = parse_env::<usize>("ARISTOTLE_MAX_CONCURRENCY").unwrap_or(8);
        let include_extensions = env::var("ARISTOTLE_INCLUDE_EXTENSIONS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|_| vec![String::from("py"), String::from("md")]);
        let exclude_dirs = env::var("ARISTOTLE_EXCLUDE_DIRS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|_| vec![String::from("node_modules"), String::from(".venv")]);
        let participant_id = env::var("ARISTOTLE_PARTICIPANT_ID")
            .unwrap_or_else(|_| DEFAULT_PARTICIPANT_ID.to_string());

        Self {
            api_base_url,
            request_timeout,
            max_concurrency,
            include_extensions,
            exclude_dirs,
            participant_id,
        }
    }
}

fn parse_env<T: FromStr + Default + PartialEq>(key: &str) -> Option<T> {
    let value = env::var(key).ok()?;
    parse_nonzero(key, &value)
}

/// Numeric settings where zero would disable the client entirely
fn parse_nonzero<T: FromStr + Default + PartialEq>(key: &str, value: &str) -> Option<T> {
    match value.trim().parse::<T>() {
        Ok(v) if v != T::default() => Some(v),
        _ => {
            tracing::warn!("Ignoring invalid value for {}: {}", key, value);
            None
        }
    }
}

/// Split a comma separated list, dropping empty entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
