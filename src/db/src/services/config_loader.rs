// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oはこのサービスに集約する。

use crate::core::config::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込み、検証する
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config =
            serde_saphyr::from_str(&content).with_context(|| "Failed to parse config file")?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        Ok(config)
    }

    /// デフォルトパスから設定を読み込む
    pub fn load_default() -> Result<Config> {
        let path = Path::new(Config::DEFAULT_CONFIG_PATH);
        Self::from_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Engine;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_from_file_valid() {
        let file = write_config(
            r#"
version: "1.0"
environments:
  development:
    engine: mysql
    host: localhost
    database: shop
    user: root
"#,
        );

        let config = ConfigLoader::from_file(file.path()).unwrap();
        let conn = config.get_connection_config("development").unwrap();
        assert_eq!(conn.engine, Engine::MySQL);
        assert_eq!(conn.resolved_port(), 3306);
        assert_eq!(config.inference.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_from_file_missing() {
        let result = ConfigLoader::from_file(Path::new("/nonexistent/.schemalens.yaml"));
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Failed to read config file"));
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let file = write_config("version: [unclosed");
        let result = ConfigLoader::from_file(file.path());
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to parse config file"));
    }

    #[test]
    fn test_from_file_rejects_invalid_environment() {
        let file = write_config(
            r#"
version: "1.0"
environments:
  development:
    engine: postgresql
    database: ""
"#,
        );

        let result = ConfigLoader::from_file(file.path());
        assert!(format!("{:#}", result.unwrap_err()).contains("Invalid config file"));
    }
}
