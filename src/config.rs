use std::env;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Values the `.env` templates commonly ship with; treated the same as an
/// unset key so a fresh checkout runs in demo mode instead of sending a
/// bogus credential upstream.
const PLACEHOLDER_KEYS: &[&str] = &["your_api_key_here", "sk-xxxx"];

/// Runtime configuration, read from the environment exactly once at startup
/// and passed by value into the relay. Nothing in the crate reads env vars
/// after this point.
#[derive(Debug, Clone)]
pub struct Config {
    /// Completion API credential. `None` forces the fallback responder.
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible provider, without trailing slash.
    pub api_base: String,
    pub model: String,
    /// When true (the default), auth and rate-limit failures from the
    /// provider are silently answered by the fallback responder instead of
    /// surfacing an error to the user.
    pub mask_remote_failures: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let api_key = resolve_key(env::var("OPENAI_API_KEY").ok());
        let api_base = env::var("OPENAI_API_BASE")
            .ok()
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = env::var("OBROL_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let mask_remote_failures = env::var("OBROL_MASK_REMOTE_FAILURES")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        Self {
            api_key,
            api_base,
            model,
            mask_remote_failures,
        }
    }

    /// Offline configuration with no credential; everything routes to the
    /// fallback responder. Handy default for tests.
    pub fn offline() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            mask_remote_failures: true,
        }
    }
}

fn resolve_key(raw: Option<String>) -> Option<String> {
    let key = raw?.trim().to_string();
    if key.is_empty() || PLACEHOLDER_KEYS.contains(&key.as_str()) {
        return None;
    }
    Some(key)
}
