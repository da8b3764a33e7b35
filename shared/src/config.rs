use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_TM_API: &str = "https://tasks.hotosm.org/api/v1";
pub const DEFAULT_GIST_API: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid settings document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid {key} endpoint: {reason}")]
    Endpoint { key: &'static str, reason: String },
}

/// Base endpoints for reference regions. Keys match the settings file the
/// shell ships (`tm-api`, `gist-api`); missing keys take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "tm-api")]
    pub tm_api: String,
    #[serde(rename = "gist-api")]
    pub gist_api: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tm_api: DEFAULT_TM_API.to_string(),
            gist_api: DEFAULT_GIST_API.to_string(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("tm-api", &self.tm_api), ("gist-api", &self.gist_api)] {
            check_http_url(value).map_err(|reason| ConfigError::Endpoint { key, reason })?;
        }
        Ok(())
    }

    pub(crate) fn project_aoi_url(&self, project: u64) -> String {
        format!("{}/project/{project}/aoi", self.tm_api.trim_end_matches('/'))
    }

    pub(crate) fn gist_url(&self, gist: &str) -> String {
        format!("{}/gists/{gist}", self.gist_api.trim_end_matches('/'))
    }
}

/// Absolute http(s) URL with a host.
pub(crate) fn check_http_url(value: &str) -> Result<(), String> {
    let url = Url::parse(value.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().unwrap_or_default().is_empty() {
        return Err("missing host".to_string());
    }
    Ok(())
}
