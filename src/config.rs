use crate::core::export::{DEFAULT_FOLDER, DEFAULT_MAX_PIXELS};
use crate::types::{GeeError, GeeResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PROJECT_ENV: &str = "GEEPLAN_PROJECT";
pub const ACCESS_TOKEN_ENV: &str = "GEEPLAN_ACCESS_TOKEN";

/// Client and export defaults, read from `<config dir>/geeplan/config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cloud project the requests are billed to
    pub project: Option<String>,
    pub api_base_url: String,
    /// OAuth2 bearer token
    pub access_token: Option<String>,
    pub export_folder: String,
    pub crs: String,
    pub max_pixels: u64,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: None,
            api_base_url: "https://earthengine.googleapis.com".to_string(),
            access_token: None,
            export_folder: DEFAULT_FOLDER.to_string(),
            crs: "EPSG:4326".to_string(),
            max_pixels: DEFAULT_MAX_PIXELS,
            request_timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("geeplan").join("config.json"))
    }

    /// Read a config file; a missing file yields the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> GeeResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        log::info!("Reading config: {}", path.display());
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| GeeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from `path` (or the default location), then apply environment overrides
    pub fn load(path: Option<&Path>) -> GeeResult<Self> {
        let mut config = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Override fields from an environment lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(project) = lookup(PROJECT_ENV).filter(|p| !p.is_empty()) {
            self.project = Some(project);
        }
        if let Some(token) = lookup(ACCESS_TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.access_token = Some(token);
        }
    }

    pub fn project(&self) -> GeeResult<&str> {
        self.project.as_deref().ok_or_else(|| {
            GeeError::Config(format!("No project configured (set {})", PROJECT_ENV))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::from_file("/nonexistent/geeplan/config.json").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.project().is_err());
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"project": "my-project", "max_pixels": 1000}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.project().unwrap(), "my-project");
        assert_eq!(config.max_pixels, 1000);
        assert_eq!(config.export_folder, "GEE_exports");
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(Config::from_file(file.path()), Err(GeeError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|name| match name {
            PROJECT_ENV => Some("env-project".to_string()),
            ACCESS_TOKEN_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.project.as_deref(), Some("env-project"));
        assert_eq!(config.access_token, None);
    }
}
