//! Configuration loading and config file resolution
//!
//! Config file resolution priority:
//! 1. Command-line argument / `REPLYDESK_CONFIG` (highest priority)
//! 2. `replydesk.toml` in the working directory
//! 3. `<OS config dir>/replydesk/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is never fatal: compiled defaults are used.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "REPLYDESK_CONFIG";

/// Config file name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "replydesk.toml";

/// Bootstrap configuration loaded from TOML
///
/// Read once at startup; restart to pick up changes.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// JSON array file holding the reply records
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Address to bind the HTTP listener to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Idle session lifetime
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: u64,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Login accounts
    #[serde(default)]
    pub users: Vec<UserConfig>,

    /// Fetch/generate commands run by `/refresh`
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            bind: default_bind(),
            port: default_port(),
            session_ttl_minutes: default_session_ttl_minutes(),
            logging: LoggingConfig::default(),
            users: Vec::new(),
            refresh: RefreshConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One login account
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub username: String,

    /// Hex SHA-256 of the password (see [`hash_password`])
    pub password_sha256: String,

    /// Store this user manages; `None` makes the user an administrator
    #[serde(default)]
    pub store_id: Option<String>,
}

/// External commands launched by the refresh route
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshConfig {
    /// Each entry is a program followed by its arguments
    #[serde(default)]
    pub commands: Vec<Vec<String>>,

    /// Working directory for the commands (defaults to the server's)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

fn default_data_file() -> PathBuf {
    PathBuf::from("approved_replies.json")
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_session_ttl_minutes() -> u64 {
    720
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Credential dictionary keyed by username
    pub fn credentials(&self) -> HashMap<String, UserConfig> {
        self.users
            .iter()
            .map(|u| (u.username.clone(), u.clone()))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for user in &self.users {
            if user.username.trim().is_empty() {
                return Err(Error::Config("User with empty username".to_string()));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(Error::Config(format!("Duplicate user: {}", user.username)));
            }
            if user.password_sha256.len() != 64
                || !user.password_sha256.chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(Error::Config(format!(
                    "User {}: password_sha256 must be 64 hex characters",
                    user.username
                )));
            }
        }
        if self.refresh.commands.iter().any(|c| c.is_empty()) {
            return Err(Error::Config("Empty refresh command".to_string()));
        }
        Ok(())
    }
}

/// Locates the config file following the priority order above
#[derive(Debug)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Path of the config file to load, if any exists
    pub fn resolve_path(&self) -> Option<PathBuf> {
        // Priority 1: explicit path or environment variable
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 2: working directory
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }

        // Priority 3: OS config directory
        dirs::config_dir()
            .map(|d| d.join("replydesk").join("config.toml"))
            .filter(|p| p.exists())
    }

    /// Load configuration, falling back to compiled defaults
    ///
    /// Returns the path that was read alongside the config. An explicitly
    /// named file that cannot be read or parsed is an error; an absent
    /// default location is not. Nothing is logged here: the caller reads
    /// the log level from the result before tracing is up.
    pub fn load(&self) -> Result<(Option<PathBuf>, TomlConfig)> {
        match self.resolve_path() {
            Some(path) => {
                let config = TomlConfig::load(&path)?;
                Ok((Some(path), config))
            }
            None => Ok((None, TomlConfig::default())),
        }
    }
}

/// Hex SHA-256 digest of a password, as stored in `password_sha256`
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Compare a password against a stored hex digest
pub fn verify_password(password: &str, password_sha256: &str) -> bool {
    let calculated = hash_password(password);
    let expected = password_sha256.to_ascii_lowercase();

    // Constant-time over equal-length digests
    calculated.len() == expected.len()
        && calculated
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_known_value() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn test_verify_password_accepts_uppercase_digest() {
        let digest = hash_password("secret").to_ascii_uppercase();
        assert!(verify_password("secret", &digest));
        assert!(!verify_password("Secret", &digest));
        assert!(!verify_password("secret", "abc"));
    }
}
