//! Application constants and configuration defaults
//!
//! Centralized location for magic numbers and default values

use std::time::Duration;

/// HTTP client configuration
pub mod http {
    use super::*;

    /// Connection timeout for HTTP requests
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Agent loop invariants
pub mod agent {
    /// Model calls per run before giving up
    pub const MAX_STEPS: usize = 15;

    /// History length that triggers pruning
    pub const HISTORY_PRUNE_THRESHOLD: usize = 20;

    /// Most recent entries kept (after the system prompt) when pruning
    pub const HISTORY_KEEP_RECENT: usize = 10;
}

/// Size caps shared by the diff engine and tools
pub mod limits {
    /// Applied batches kept for undo
    pub const MAX_UNDO_BATCHES: usize = 20;

    /// Characters of shell output returned to the model
    pub const MAX_COMMAND_OUTPUT_CHARS: usize = 30_000;

    /// Results returned by `find` and `grep`
    pub const MAX_SEARCH_RESULTS: usize = 100;

    /// Entries returned by `list`
    pub const MAX_LIST_ENTRIES: usize = 500;

    /// Longest regex pattern accepted by `grep`
    pub const MAX_PATTERN_LENGTH: usize = 1000;
}

/// Defaults for `QuillConfig`
pub mod defaults {
    pub const MODEL: &str = "llama3.1";
    pub const BASE_URL: &str = "http://localhost:11434/v1";
    pub const INACTIVITY_TIMEOUT_SECS: u64 = 60;
    pub const TOOL_TIMEOUT_SECS: u64 = 120;
    pub const CHUNK_SIZE_CHARS: usize = 4000;
    pub const READ_MAX_TOKENS: usize = 4000;
    pub const CONTEXT_MAX_TOKENS: usize = 8000;
    pub const CHARS_PER_TOKEN: usize = 4;
}

/// Filesystem layout under the home directory
pub mod files {
    /// Config directory name
    pub const CONFIG_DIR_NAME: &str = ".quill";

    pub const CONFIG_FILE_NAME: &str = "config.toml";

    pub const DATABASE_FILE_NAME: &str = "quill.db";

    pub const LOG_FILE_NAME: &str = "quill.log";
}
