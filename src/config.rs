// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::utils::validation::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub pipeline: PipelineConfig,
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub status_refresh: bool,
    pub max_file_size_mb: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewConfig {
    pub page_size: usize,
    pub download_dir: PathBuf,
    pub report_suffix: String,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PipelineConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        (self.max_file_size_mb as u64) * 1_048_576
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default_config();
        let mut builder = config::Config::builder()
            .set_default("gateway.base_url", defaults.gateway.base_url)
            .and_then(|b| b.set_default("gateway.timeout_secs", defaults.gateway.timeout_secs))
            .and_then(|b| b.set_default("pipeline.status_refresh", defaults.pipeline.status_refresh))
            .and_then(|b| {
                b.set_default(
                    "pipeline.max_file_size_mb",
                    defaults.pipeline.max_file_size_mb as u64,
                )
            })
            .and_then(|b| b.set_default("view.page_size", defaults.view.page_size as u64))
            .and_then(|b| {
                b.set_default(
                    "view.download_dir",
                    defaults.view.download_dir.display().to_string(),
                )
            })
            .and_then(|b| b.set_default("view.report_suffix", defaults.view.report_suffix))
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CSV_PIPELINE")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            gateway: GatewayConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: 30,
            },
            pipeline: PipelineConfig {
                status_refresh: true,
                max_file_size_mb: 10,
            },
            view: ViewConfig {
                page_size: 10,
                download_dir: PathBuf::from("./downloads"),
                report_suffix: "_report".to_string(),
            },
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self> {
        self.gateway.base_url = base_url.into();
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        Validator::validate_url(&self.gateway.base_url)
            .map_err(|e| PipelineError::Config(e.user_message()))?;

        if self.gateway.timeout_secs == 0 {
            return Err(PipelineError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.view.page_size == 0 {
            return Err(PipelineError::Config(
                "page_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.view.page_size, 10);
        assert_eq!(config.pipeline.max_file_size_bytes(), 10 * 1_048_576);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pipeline.toml");
        fs::write(
            &path,
            r#"
[gateway]
base_url = "https://cleaner.example.com"
timeout_secs = 5
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.gateway.base_url, "https://cleaner.example.com");
        assert_eq!(config.gateway.timeout(), Duration::from_secs(5));
        assert_eq!(config.view.report_suffix, "_report");
        assert!(config.pipeline.status_refresh);
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = Config::default_config().with_base_url("localhost:8000");
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let mut config = Config::default_config();
        config.view.page_size = 0;
        assert!(config.validate().is_err());
    }
}
