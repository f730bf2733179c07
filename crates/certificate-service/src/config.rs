//! Configuration management for the Certificate Service
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use certificate_renderer::{AssetPaths, Layout};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::dates::IssueDates;

/// Which document store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("Unknown STORE_BACKEND: {}", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub host: String,

    /// API server port
    pub port: u16,

    pub store_backend: StoreBackend,

    pub redis_url: String,

    pub template_path: PathBuf,

    pub signature_path: PathBuf,

    /// Preferred font
    pub font_path: PathBuf,

    /// System font used when the preferred font is unavailable
    pub fallback_font_path: PathBuf,

    /// Optional JSON file replacing the built-in layout
    pub layout_path: Option<PathBuf>,

    /// Base URL used in validation links. Derived from each request when unset.
    pub public_base_url: Option<String>,

    /// strftime pattern for the issue date
    pub date_format: String,

    pub date_locale: String,

    /// Largest accepted roster upload
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Config {
            host: var("CERT_HOST", "0.0.0.0"),

            port: var("CERT_PORT", "8080")
                .parse()
                .context("Invalid CERT_PORT")?,

            store_backend: var("STORE_BACKEND", "redis").parse()?,

            redis_url: var("REDIS_URL", "redis://127.0.0.1:6379"),

            template_path: var("TEMPLATE_PATH", "static/certificate_template.png").into(),

            signature_path: var("SIGNATURE_PATH", "static/signature.png").into(),

            font_path: var("FONT_PATH", "static/fonts/Arial.ttf").into(),

            fallback_font_path: var(
                "FALLBACK_FONT_PATH",
                "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            )
            .into(),

            layout_path: optional("LAYOUT_PATH").map(PathBuf::from),

            public_base_url: optional("PUBLIC_BASE_URL"),

            date_format: var("DATE_FORMAT", "%d de %B de %Y"),

            date_locale: var("DATE_LOCALE", "pt_BR"),

            max_upload_bytes: var("MAX_UPLOAD_BYTES", "5242880")
                .parse()
                .context("Invalid MAX_UPLOAD_BYTES")?,
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("CERT_PORT must be greater than 0");
        }

        if self.max_upload_bytes == 0 {
            anyhow::bail!("MAX_UPLOAD_BYTES must be greater than 0");
        }

        if let Some(url) = &self.public_base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("PUBLIC_BASE_URL must start with http:// or https://");
            }
        }

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn asset_paths(&self) -> AssetPaths {
        AssetPaths {
            template: self.template_path.clone(),
            signature: self.signature_path.clone(),
            font: self.font_path.clone(),
            fallback_font: self.fallback_font_path.clone(),
        }
    }

    /// The configured layout, or the built-in one
    pub fn load_layout(&self) -> Result<Layout> {
        match &self.layout_path {
            Some(path) => Layout::parse_file(path)
                .with_context(|| format!("Failed to load layout: {}", path.display())),
            None => Ok(Layout::default()),
        }
    }

    pub fn issue_dates(&self) -> Result<IssueDates> {
        IssueDates::new(&self.date_format, &self.date_locale)
            .context("Invalid DATE_FORMAT or DATE_LOCALE")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_from(&[]).expect("Failed to load config");

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.store_backend, StoreBackend::Redis);
        assert_eq!(config.template_path, PathBuf::from("static/certificate_template.png"));
        assert_eq!(config.font_path, PathBuf::from("static/fonts/Arial.ttf"));
        assert!(config.layout_path.is_none());
        assert!(config.public_base_url.is_none());
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CERT_PORT", "9000"),
            ("STORE_BACKEND", "Memory"),
            ("PUBLIC_BASE_URL", "https://certs.example.com"),
            ("LAYOUT_PATH", "/etc/certs/layout.json"),
        ])
        .unwrap();

        assert_eq!(config.address(), "0.0.0.0:9000");
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(
            config.public_base_url.as_deref(),
            Some("https://certs.example.com")
        );
        assert_eq!(
            config.layout_path,
            Some(PathBuf::from("/etc/certs/layout.json"))
        );
    }

    #[test]
    fn test_blank_optional_values_are_unset() {
        let config = config_from(&[("PUBLIC_BASE_URL", "  ")]).unwrap();

        assert!(config.public_base_url.is_none());
    }

    #[test]
    fn test_validate_invalid_port() {
        let result = config_from(&[("CERT_PORT", "0")]);

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("CERT_PORT must be greater than 0"));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(config_from(&[("STORE_BACKEND", "firestore")]).is_err());
    }

    #[test]
    fn test_base_url_needs_scheme() {
        assert!(config_from(&[("PUBLIC_BASE_URL", "certs.example.com")]).is_err());
    }

    #[test]
    fn test_default_layout_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.load_layout().unwrap(), Layout::default());
    }

    #[test]
    fn test_default_dates_are_valid() {
        let config = config_from(&[]).unwrap();

        assert!(config.issue_dates().is_ok());
    }
}
