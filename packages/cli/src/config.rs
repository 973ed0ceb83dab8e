use anyhow::Context;
use std::path::{Path, PathBuf};
use tradebook_editor::EditorConfig;

pub const DEFAULT_CONFIG_NAME: &str = "tradebook.config.json";

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// Load the editor configuration
///
/// An explicit path must exist. Otherwise `tradebook.config.json` in `cwd`
/// is used when present, and the built-in defaults when it is not.
pub fn load(cwd: &Path, explicit: Option<&Path>) -> anyhow::Result<(EditorConfig, ConfigSource)> {
    let config_path = match explicit {
        Some(path) => cwd.join(path),
        None => {
            let path = cwd.join(DEFAULT_CONFIG_NAME);
            if !path.exists() {
                tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_NAME);
                return Ok((EditorConfig::default(), ConfigSource::Defaults));
            }
            path
        }
    };

    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Cannot read config {}", config_path.display()))?;
    let config: EditorConfig = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok((config, ConfigSource::File(config_path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let (config, source) = load(dir.path(), None).unwrap();

        assert_eq!(config, EditorConfig::default());
        assert_eq!(source, ConfigSource::Defaults);
    }

    #[test]
    fn test_reads_config_from_cwd() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "historyCapacity": 20, "zoom": { "closeDurationMs": 150 } }"#,
        )
        .unwrap();

        let (config, source) = load(dir.path(), None).unwrap();
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.zoom.close_duration_ms, 150);
        assert_eq!(config.zoom.open_delay_ms, 10);
        assert!(matches!(source, ConfigSource::File(_)));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = load(dir.path(), Some(Path::new("missing.json"))).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_explicit_path_overrides_cwd_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "historyCapacity": 20 }"#).unwrap();
        fs::write(dir.path().join("strict.json"), r#"{ "historyCapacity": 5 }"#).unwrap();

        let (config, _) = load(dir.path(), Some(Path::new("strict.json"))).unwrap();
        assert_eq!(config.history_capacity, 5);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{ historyCapacity: }").unwrap();

        assert!(load(dir.path(), None).is_err());
    }
}
