#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SessionError;

pub const DEFAULT_AGENT_URL: &str = "http://127.0.0.1:3001";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a writing assistant helping with blog content.

You have access to the user's blog folder and can:
- Read existing posts to understand their style and topics
- Help draft, edit, and improve content
- Run shell commands when needed (e.g., for git operations)

Be concise but helpful. When reading files, summarize what you find rather than
dumping entire contents unless asked.
";

pub const DEFAULT_ALLOWED_TOOLS: [&str; 6] = ["Read", "Write", "Edit", "Bash", "Glob", "Grep"];

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent_url: String,
    pub request_timeout_secs: u64,
    pub system_prompt: String,
    pub allowed_tools: Vec<String>,
    /// Enter inserts a newline and Alt+Enter submits.
    pub multiline: bool,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub theme: ThemeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent_url: DEFAULT_AGENT_URL.to_string(),
            request_timeout_secs: 300,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            allowed_tools: DEFAULT_ALLOWED_TOOLS.iter().map(|t| t.to_string()).collect(),
            multiline: true,
            log_level: "info".to_string(),
            log_file: None,
            theme: ThemeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub enabled: bool,
    pub banner: [u8; 3],
    pub user: [u8; 3],
    pub assistant: [u8; 3],
    pub meta: [u8; 3],
    pub error: [u8; 3],
    pub tool: [u8; 3],
    pub path: [u8; 3],
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            banner: [156, 147, 138],
            user: [86, 148, 148],
            assistant: [217, 119, 87],
            meta: [180, 156, 120],
            error: [204, 82, 82],
            tool: [140, 160, 160],
            path: [120, 140, 180],
        }
    }
}

impl Config {
    /// `<config_dir>/scribe/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("scribe").join("config.toml"))
    }

    /// Loads the default config file, or defaults when there is none.
    pub fn load() -> Result<Self, SessionError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads `path`. A missing file yields defaults; an unreadable or
    /// malformed one is an error naming the file.
    pub fn load_from(path: &Path) -> Result<Self, SessionError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&contents)
            .map_err(|e| SessionError::Config(format!("{}: {}", path.display(), e)))
    }

    fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Where logs go: the configured file, else `<cache_dir>/scribe/scribe.log`,
    /// else `scribe.log` in the current directory.
    pub fn log_file_path(&self) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }
        dirs::cache_dir()
            .map(|dir| dir.join("scribe").join("scribe.log"))
            .unwrap_or_else(|| PathBuf::from("scribe.log"))
    }
}
