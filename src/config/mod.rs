// Configuration management
use crate::error::{CentralError, Result};
use crate::models::Credentials;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_TOKEN_URL: &str = "https://id.sophos.com/api/v2/oauth2/token";
pub const DEFAULT_WHOAMI_URL: &str = "https://api.central.sophos.com/whoami/v1";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Upstream endpoints; overridable for alternate deployments and tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_whoami_url")]
    pub whoami_url: String,
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_whoami_url() -> String {
    DEFAULT_WHOAMI_URL.to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token_url: default_token_url(),
            whoami_url: default_whoami_url(),
        }
    }
}

impl Config {
    /// Config lives under `$XDG_CONFIG_HOME/locsites` when that is set,
    /// otherwise `~/.config/locsites` if the user has a `~/.config`, and
    /// `~/.locsites` as the last resort (so `~/.config` is never created
    /// just for us).
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg).join("locsites"));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            CentralError::ConfigError("Could not determine home directory".to_string())
        })?;

        let dot_config = home.join(".config");
        if dot_config.exists() {
            Ok(dot_config.join("locsites"))
        } else {
            Ok(home.join(".locsites"))
        }
    }

    /// Get the config file path
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        let config = if config_path.exists() {
            tracing::debug!("Loading config from: {}", config_path.display());
            let contents = fs::read_to_string(&config_path).map_err(|e| {
                CentralError::ConfigError(format!("Failed to read config file: {}", e))
            })?;

            toml::from_str(&contents).map_err(|e| {
                CentralError::ConfigError(format!("Failed to parse config file: {}", e))
            })?
        } else {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Config::default()
        };

        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(client_id) = std::env::var("SOPHOS_CLIENT_ID") {
            self.api.client_id = Some(client_id);
        }
        if let Ok(client_secret) = std::env::var("SOPHOS_CLIENT_SECRET") {
            self.api.client_secret = Some(client_secret);
        }
        if let Ok(token_url) = std::env::var("SOPHOS_TOKEN_URL") {
            tracing::debug!("Using SOPHOS_TOKEN_URL from environment: {}", token_url);
            self.endpoints.token_url = token_url;
        }
        if let Ok(whoami_url) = std::env::var("SOPHOS_WHOAMI_URL") {
            tracing::debug!("Using SOPHOS_WHOAMI_URL from environment: {}", whoami_url);
            self.endpoints.whoami_url = whoami_url;
        }
        self
    }

    /// Resolve credentials from CLI arguments, environment, or config file
    ///
    /// CLI arguments win (clap already folds SOPHOS_CLIENT_ID / SOPHOS_CLIENT_SECRET
    /// env vars into them); the config file is the fallback. Values are trimmed
    /// since they usually arrive via copy-paste.
    pub fn resolve_credentials(
        &self,
        client_id_arg: Option<String>,
        client_secret_arg: Option<String>,
    ) -> Result<Credentials> {
        let client_id = client_id_arg
            .or_else(|| self.api.client_id.clone())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let client_secret = client_secret_arg
            .or_else(|| self.api.client_secret.clone())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(Credentials {
                client_id,
                client_secret,
            }),
            _ => Err(CentralError::ConfigError(
                "API credentials not configured. Pass --client-id/--client-secret, \
                 set SOPHOS_CLIENT_ID/SOPHOS_CLIENT_SECRET, or add them to the config file"
                    .to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_dir_honors_xdg_config_home() {
        let dir = tempfile::tempdir().unwrap();
        let previous = std::env::var("XDG_CONFIG_HOME").ok();
        std::env::set_var("XDG_CONFIG_HOME", dir.path());

        let resolved = Config::config_dir().unwrap();

        match previous {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
        assert_eq!(resolved, dir.path().join("locsites"));
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(endpoints.whoami_url, DEFAULT_WHOAMI_URL);
    }

    #[test]
    fn test_parse_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[api]
client_id = "abc"
client_secret = "def"

[endpoints]
token_url = "http://localhost:9999/token"
"#
        )
        .unwrap();

        let contents = fs::read_to_string(file.path()).unwrap();
        let config: Config = toml::from_str(&contents).unwrap();
        assert_eq!(config.api.client_id.as_deref(), Some("abc"));
        assert_eq!(config.endpoints.token_url, "http://localhost:9999/token");
        // Unset endpoint falls back to the default
        assert_eq!(config.endpoints.whoami_url, DEFAULT_WHOAMI_URL);
    }

    #[test]
    fn test_resolve_credentials_prefers_args() {
        let config = Config {
            api: ApiConfig {
                client_id: Some("file-id".to_string()),
                client_secret: Some("file-secret".to_string()),
            },
            ..Default::default()
        };

        let creds = config
            .resolve_credentials(Some("  arg-id  ".to_string()), None)
            .unwrap();
        assert_eq!(creds.client_id, "arg-id");
        assert_eq!(creds.client_secret, "file-secret");
    }

    #[test]
    fn test_resolve_credentials_missing() {
        let config = Config::default();
        assert!(config.resolve_credentials(None, None).is_err());

        // Blank values don't count as configured
        let blank = Config {
            api: ApiConfig {
                client_id: Some("id".to_string()),
                client_secret: Some("   ".to_string()),
            },
            ..Default::default()
        };
        assert!(blank.resolve_credentials(None, None).is_err());
    }
}
