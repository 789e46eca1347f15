use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_RETRIES: u32 = 3;

/// Settings for the recipe REST API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Total attempts per request, at least 1.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retries: DEFAULT_RETRIES,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl ApiConfig {
    /// Build from `CHOOSY_API_*` variables, as returned by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut api = Self::default();

        if let Some(url) = lookup("CHOOSY_API_URL") {
            let url = url.trim().trim_end_matches('/');
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("CHOOSY_API_URL must start with http:// or https://, got '{url}'");
            }
            api.base_url = url.to_string();
        }

        if let Some(ms) = lookup("CHOOSY_API_TIMEOUT_MS") {
            let ms: u64 = ms
                .trim()
                .parse()
                .with_context(|| format!("Invalid CHOOSY_API_TIMEOUT_MS: '{ms}'"))?;
            if ms == 0 {
                bail!("CHOOSY_API_TIMEOUT_MS must be greater than 0");
            }
            api.timeout = Duration::from_millis(ms);
        }

        if let Some(n) = lookup("CHOOSY_API_RETRIES") {
            let n: u32 = n
                .trim()
                .parse()
                .with_context(|| format!("Invalid CHOOSY_API_RETRIES: '{n}'"))?;
            if n == 0 {
                bail!("CHOOSY_API_RETRIES must be at least 1");
            }
            api.retries = n;
        }

        Ok(api)
    }
}

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub api: ApiConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "choosy").context("Could not determine home directory")?;
        let api = ApiConfig::from_lookup(|key| std::env::var(key).ok())?;
        Self::with_data_dir(proj_dirs.data_dir().to_path_buf(), api)
    }

    pub fn with_data_dir(data_dir: PathBuf, api: ApiConfig) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("choosy.db");

        Ok(Config {
            db_path,
            data_dir,
            api,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_api_defaults() {
        let api = ApiConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(api.base_url, DEFAULT_API_URL);
        assert_eq!(api.timeout, Duration::from_secs(10));
        assert_eq!(api.retries, 3);
        assert_eq!(api.retry_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_api_overrides() {
        let api = ApiConfig::from_lookup(lookup_from(&[
            ("CHOOSY_API_URL", "https://recipes.example.com/"),
            ("CHOOSY_API_TIMEOUT_MS", "2500"),
            ("CHOOSY_API_RETRIES", "1"),
        ]))
        .unwrap();
        assert_eq!(api.base_url, "https://recipes.example.com");
        assert_eq!(api.timeout, Duration::from_millis(2500));
        assert_eq!(api.retries, 1);
    }

    #[test]
    fn test_api_invalid_values() {
        assert!(ApiConfig::from_lookup(lookup_from(&[("CHOOSY_API_RETRIES", "0")])).is_err());
        assert!(ApiConfig::from_lookup(lookup_from(&[("CHOOSY_API_RETRIES", "x")])).is_err());
        assert!(ApiConfig::from_lookup(lookup_from(&[("CHOOSY_API_TIMEOUT_MS", "0")])).is_err());
        assert!(ApiConfig::from_lookup(lookup_from(&[("CHOOSY_API_URL", "ftp://x")])).is_err());
    }

    #[test]
    fn test_with_data_dir_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("choosy");
        let config = Config::with_data_dir(dir.clone(), ApiConfig::default()).unwrap();
        assert!(dir.is_dir());
        assert_eq!(config.data_dir, dir);
        assert_eq!(config.db_path, dir.join("choosy.db"));
    }
}
