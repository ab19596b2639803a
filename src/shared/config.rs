use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "chatgpt-history";
const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExportConfig {
    /// Export `.zip` or `conversations.json`. Command-line flag and
    /// `CHATGPT_EXPORT_PATH` take precedence.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "SearchConfig::default_limit")]
    pub default_limit: usize,
    #[serde(default = "SearchConfig::default_max_limit")]
    pub max_limit: usize,
    #[serde(default = "SearchConfig::default_max_query_chars")]
    pub max_query_chars: usize,
    #[serde(default = "SearchConfig::default_preview_chars")]
    pub preview_chars: usize,
}

impl SearchConfig {
    fn default_limit() -> usize {
        10
    }

    fn default_max_limit() -> usize {
        50
    }

    fn default_max_query_chars() -> usize {
        500
    }

    fn default_preview_chars() -> usize {
        200
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: Self::default_limit(),
            max_limit: Self::default_max_limit(),
            max_query_chars: Self::default_max_query_chars(),
            preview_chars: Self::default_preview_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    #[serde(default = "ListConfig::default_limit")]
    pub default_limit: usize,
    #[serde(default = "ListConfig::default_max_limit")]
    pub max_limit: usize,
}

impl ListConfig {
    fn default_limit() -> usize {
        20
    }

    fn default_max_limit() -> usize {
        100
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_limit: Self::default_limit(),
            max_limit: Self::default_max_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    #[serde(default = "ConversationConfig::default_max_messages")]
    pub max_messages: usize,
}

impl ConversationConfig {
    fn default_max_messages() -> usize {
        500
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_messages: Self::default_max_messages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`, or from the default location when `None`.
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Ok(p) => p,
                Err(_) => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    /// First of: explicit override (flag or env), config file value.
    pub fn resolve_export_path(&self, cli_path: Option<PathBuf>) -> Option<PathBuf> {
        cli_path
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| self.export.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.yaml"))).unwrap();

        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.search.max_limit, 50);
        assert_eq!(config.list.default_limit, 20);
        assert_eq!(config.list.max_limit, 100);
        assert_eq!(config.conversation.max_messages, 500);
        assert_eq!(config.logging.level, "info");
        assert!(config.export.path.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "export:\n  path: /data/export.zip\nsearch:\n  default_limit: 5\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.search.default_limit, 5);
        assert_eq!(config.search.max_limit, 50);
        assert_eq!(config.export.path, Some(PathBuf::from("/data/export.zip")));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "search: [not, a, map]\n").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_export_path_precedence() {
        let mut config = Config::default();
        config.export.path = Some(PathBuf::from("from-config.zip"));

        assert_eq!(
            config.resolve_export_path(Some(PathBuf::from("from-cli.zip"))),
            Some(PathBuf::from("from-cli.zip"))
        );
        assert_eq!(
            config.resolve_export_path(Some(PathBuf::new())),
            Some(PathBuf::from("from-config.zip"))
        );
        assert_eq!(Config::default().resolve_export_path(None), None);
    }
}
