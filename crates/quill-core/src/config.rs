//! User configuration loaded from `~/.quill/config.toml`

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::context::ContextBudget;
use crate::paths;

/// Every field is optional in the file; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the bearer token
    pub api_key_env: Option<String>,
    pub inactivity_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub chunk_size_chars: usize,
    pub read_max_tokens: usize,
    pub context_max_tokens: usize,
    pub chars_per_token: usize,
    /// Approve previews, drift overrides and shell commands without asking
    pub auto_approve: bool,
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            model: defaults::MODEL.to_string(),
            base_url: defaults::BASE_URL.to_string(),
            api_key_env: None,
            inactivity_timeout_secs: defaults::INACTIVITY_TIMEOUT_SECS,
            tool_timeout_secs: defaults::TOOL_TIMEOUT_SECS,
            chunk_size_chars: defaults::CHUNK_SIZE_CHARS,
            read_max_tokens: defaults::READ_MAX_TOKENS,
            context_max_tokens: defaults::CONTEXT_MAX_TOKENS,
            chars_per_token: defaults::CHARS_PER_TOKEN,
            auto_approve: false,
        }
    }
}

impl QuillConfig {
    /// Load from the default location, then apply environment overrides.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&paths::config_file())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply `QUILL_MODEL` / `QUILL_BASE_URL` from a variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup("QUILL_MODEL").filter(|v| !v.is_empty()) {
            self.model = model;
        }
        if let Some(url) = lookup("QUILL_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
    }

    pub fn inactivity_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.inactivity_timeout_secs)
    }

    pub fn tool_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tool_timeout_secs)
    }

    /// Budget for `@path` and pinned-file context
    pub fn context_budget(&self) -> ContextBudget {
        ContextBudget {
            max_tokens: self.context_max_tokens,
            chunk_size_chars: self.chunk_size_chars,
            chars_per_token: self.chars_per_token,
        }
    }

    /// Budget for a single `read` tool call
    pub fn read_budget(&self) -> ContextBudget {
        ContextBudget {
            max_tokens: self.read_max_tokens,
            chunk_size_chars: self.chunk_size_chars,
            chars_per_token: self.chars_per_token,
        }
    }
}
