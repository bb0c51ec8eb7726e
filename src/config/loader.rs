use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::GuardConfig;

/// Load configuration from a file using the config crate
/// Supports multiple formats: TOML, YAML, JSON, INI.
pub async fn load_config(config_path: &str) -> Result<GuardConfig> {
    load_config_sync(config_path)
}

/// Load configuration synchronously
pub fn load_config_sync(config_path: &str) -> Result<GuardConfig> {
    let config_path = Path::new(config_path);

    // Determine file format based on extension
    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Toml,
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let guard_config: GuardConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(guard_config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[tokio::test]
    async fn test_load_toml_config() {
        let toml_content = r#"
listen_addr = "0.0.0.0:8080"
log_truncate_chars = 64

[bot_blocklist]
enabled = true
extra_identifiers = ["lotscraper"]

[size_limit]
max_length = 1024
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.log_truncate_chars, 64);
        assert!(config.bot_blocklist.enabled);
        assert_eq!(config.bot_blocklist.extra_identifiers, vec!["lotscraper"]);
        assert_eq!(config.size_limit.max_length, 1024);
        assert!(config.size_limit.enabled);
        assert!(config.sensitive_paths.enabled);
    }

    #[tokio::test]
    async fn test_load_json_config() {
        let json_content = r#"
{
  "listen_addr": "127.0.0.1:3000",
  "sensitive_paths": {
    "extra_patterns": ["^/staging"]
  },
  "headers": {
    "tracking_header": "x-trace-id"
  }
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.sensitive_paths.extra_patterns, vec!["^/staging"]);
        assert_eq!(config.headers.tracking_header, "x-trace-id");
        assert_eq!(config.headers.content_type_options, "nosniff");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        assert!(load_config("/nonexistent/guard.toml").await.is_err());
    }
}
