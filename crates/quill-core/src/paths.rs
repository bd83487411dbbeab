//! Well-known locations under `~/.quill`

use std::path::PathBuf;

use crate::constants::files;

/// `~/.quill`, falling back to `./.quill` when no home directory is known
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(files::CONFIG_DIR_NAME)
}

pub fn config_file() -> PathBuf {
    config_dir().join(files::CONFIG_FILE_NAME)
}

pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

pub fn log_file() -> PathBuf {
    logs_dir().join(files::LOG_FILE_NAME)
}

pub fn database_file() -> PathBuf {
    config_dir().join(files::DATABASE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_config_dir() {
        let root = config_dir();
        assert!(root.ends_with(".quill"));
        assert!(config_file().starts_with(&root));
        assert!(log_file().starts_with(logs_dir()));
        assert_eq!(database_file().file_name().unwrap(), "quill.db");
    }
}
