use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::warn;
use url::Url;

pub const CONFIG_FILE: &str = "taxcalc.toml";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_base_url(base_url.as_ref());
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn endpoints(&self) -> ApiEndpoints {
        ApiEndpoints::new(&self.base_url)
    }
}

/// Absolute URLs of the remote tax service endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub base_url: String,
    pub municipalities: String,
    pub regions: String,
    pub tax_calculate: String,
}

impl ApiEndpoints {
    pub fn new(base_url: &str) -> Self {
        let base_url = normalize_base_url(base_url);
        Self {
            municipalities: format!("{base_url}/municipalities"),
            regions: format!("{base_url}/regions"),
            tax_calculate: format!("{base_url}/tax/calculate"),
            base_url,
        }
    }
}

/// Defaults, then `taxcalc.toml` in the working directory, then environment.
pub fn load_config() -> ApiConfig {
    load_config_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

pub fn load_config_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> ApiConfig {
    let mut config = ApiConfig::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<ApiConfig>(&raw) {
            Ok(file_cfg) => config = file_cfg,
            Err(err) => warn!(path = %path.display(), error = %err, "ignoring invalid config file"),
        }
    }

    if let Some(v) = env("TAX_API_BASE_URL") {
        config.base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        config.base_url = v;
    }

    if let Some(v) = env("TAX_API_TIMEOUT_SECS").or_else(|| env("APP__API_TIMEOUT_SECS")) {
        match v.trim().parse::<u64>() {
            Ok(parsed) => config.request_timeout_secs = parsed,
            Err(_) => warn!(value = %v, "ignoring non-numeric api timeout"),
        }
    }

    config.base_url = normalize_base_url(&config.base_url);
    config
}

fn normalize_base_url(raw_base_url: &str) -> String {
    let raw_base_url = raw_base_url.trim().trim_end_matches('/');

    if raw_base_url.is_empty() {
        return DEFAULT_BASE_URL.to_string();
    }

    match Url::parse(raw_base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => raw_base_url.to_string(),
        _ => {
            warn!(base_url = raw_base_url, "invalid api base url, using default");
            DEFAULT_BASE_URL.to_string()
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
