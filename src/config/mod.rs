use std::env;
use std::path::PathBuf;
use anyhow::{Result, Context};
use tracing::{info, warn};

/// Shape of log lines on stdout, chosen by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    /// One JSON object per event, for log shippers.
    Json,
}

impl LogFormat {
    /// Read before the subscriber exists, so it cannot log; unknown values
    /// mean `Pretty`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("LOG_FORMAT").map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub max_file_size_mb: usize,
    /// Number of uploads allowed to run the pipeline at once. Later uploads wait.
    pub max_concurrent_requests: usize,
    pub ner_model_dir: PathBuf,
    pub ocr_dpi: u32,
    pub ocr_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            max_file_size_mb: 10,
            max_concurrent_requests: 1,
            ner_model_dir: PathBuf::from("models/bert-base-ner"),
            ocr_dpi: 200,
            ocr_language: "eng".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source, falling back to
    /// defaults for anything missing or unparsable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let config = Config {
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| {
                info!("SERVER_HOST not set, using default: {}", defaults.server_host);
                defaults.server_host.clone()
            }),
            server_port: Self::parse_var(&lookup, "SERVER_PORT", defaults.server_port)
                .context("Failed to parse SERVER_PORT")?,
            max_file_size_mb: Self::parse_var(&lookup, "MAX_FILE_SIZE_MB", defaults.max_file_size_mb)
                .context("Failed to parse MAX_FILE_SIZE_MB")?,
            max_concurrent_requests: Self::parse_var(
                &lookup,
                "MAX_CONCURRENT_REQUESTS",
                defaults.max_concurrent_requests,
            )
            .context("Failed to parse MAX_CONCURRENT_REQUESTS")?,
            ner_model_dir: lookup("NER_MODEL_DIR").map(PathBuf::from).unwrap_or_else(|| {
                info!(
                    "NER_MODEL_DIR not set, using default: {}",
                    defaults.ner_model_dir.display()
                );
                defaults.ner_model_dir.clone()
            }),
            ocr_dpi: Self::parse_var(&lookup, "OCR_DPI", defaults.ocr_dpi)
                .context("Failed to parse OCR_DPI")?,
            ocr_language: lookup("OCR_LANGUAGE")
                .map(|lang| lang.trim().to_string())
                .filter(|lang| !lang.is_empty())
                .unwrap_or(defaults.ocr_language),
        };

        config.validate()?;

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn parse_var<F, T>(lookup: &F, var_name: &str, default: T) -> Result<T>
    where
        F: Fn(&str) -> Option<String>,
        T: std::str::FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match lookup(var_name) {
            Some(val) => match val.trim().parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            None => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_REQUESTS must be greater than 0"));
        }
        if self.ocr_dpi < 50 || self.ocr_dpi > 1200 {
            return Err(anyhow::anyhow!("OCR_DPI must be between 50 and 1200"));
        }
        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }
}
