//! Configuration loading and resolution.

use std::path::{Path, PathBuf};

use testweave::{ConfigError, LearnerConfig};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "TESTWEAVE_CONFIG";

/// Failure to load a config file from disk.
#[derive(thiserror::Error, Debug)]
pub enum ConfigFileError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Invalid { path: PathBuf, source: ConfigError },
}

/// Resolve the config file path.
///
/// Order: explicit flag, then `TESTWEAVE_CONFIG`, then
/// `./.testweave/config.json` when it exists. `None` means built-in defaults.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if !env_path.trim().is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    let cwd_config = PathBuf::from(".testweave/config.json");
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    None
}

/// Read and validate a config file.
pub fn load_config_file(path: &Path) -> Result<LearnerConfig, ConfigFileError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    LearnerConfig::from_json_str(&json).map_err(|source| ConfigFileError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve and load the config, falling back to defaults when no file applies.
pub fn load_config(explicit: Option<&str>) -> Result<LearnerConfig, ConfigFileError> {
    match resolve_config_path(explicit) {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            load_config_file(&path)
        }
        None => Ok(LearnerConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_config_path(Some("/tmp/custom.json"));
        assert_eq!(path, Some(PathBuf::from("/tmp/custom.json")));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "synthesis": { "max_per_type": 2 } }"#).unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.synthesis.max_per_type, Some(2));
        assert_eq!(config.timeouts, LearnerConfig::default().timeouts);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_config_file(Path::new("/nonexistent/testweave.json")).unwrap_err();
        assert!(matches!(err, ConfigFileError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/testweave.json"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "classifier": { "min_samples": 0 } }"#).unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigFileError::Invalid { .. }));
    }
}
