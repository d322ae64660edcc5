use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const MCPHOST_DIR: &str = ".mcphost";
const DEFAULT_SERVERS_FILE: &str = "servers.yaml";
const EXAMPLE_SERVERS_FILE: &str = "servers.example.yaml";

/// How the tool client manager reaches its tools.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientMode {
    /// Protocol sessions when servers are configured, built-in tools otherwise.
    #[default]
    Auto,
    Protocol,
    Builtin,
}

/// One tool-providing subprocess.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, deserialize_with = "nullable_env")]
    pub env: HashMap<String, String>,
}

fn nullable_env<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
struct ServersFile {
    #[serde(default)]
    servers: Vec<ServerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_steps: usize,
    pub client_mode: ClientMode,
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub workspace_dir: PathBuf,
    pub log_path: PathBuf,
    pub servers_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: None,
            api_key: String::new(),
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_steps: 25,
            client_mode: ClientMode::Auto,
            request_timeout_secs: 60,
            log_level: "info".to_string(),
            workspace_dir: PathBuf::from("workspace"),
            log_path: PathBuf::from("logs/mcp_interactions.log.jsonl"),
            servers_path: PathBuf::from(DEFAULT_SERVERS_FILE),
        }
    }
}

pub fn get_mcphost_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(MCPHOST_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_mcphost_dir().join("config.toml")
}

pub fn ensure_mcphost_dir() -> Result<PathBuf> {
    let dir = get_mcphost_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).with_context(|| {
            format!("Failed to create mcphost directory at {}", dir.display())
        })?;
    }

    Ok(dir)
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let mut config = if config_exists() {
            load_config()?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        config.resolve_paths()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(dir) = env_non_empty("WORKSPACE_DIR") {
            self.workspace_dir = PathBuf::from(dir);
        }
        if let Some(path) = env_non_empty("LOG_PATH") {
            self.log_path = PathBuf::from(path);
        }
        if let Some(path) = env_non_empty("SERVERS_YAML") {
            self.servers_path = PathBuf::from(path);
        }
        if let Some(model) = env_non_empty("MCPHOST_MODEL") {
            self.model = model;
        }
    }

    /// Makes the workspace and log locations absolute against the current directory.
    fn resolve_paths(&mut self) -> Result<()> {
        self.workspace_dir = std::path::absolute(&self.workspace_dir).with_context(|| {
            format!("Failed to resolve workspace {}", self.workspace_dir.display())
        })?;
        self.log_path = std::path::absolute(&self.log_path)
            .with_context(|| format!("Failed to resolve log path {}", self.log_path.display()))?;
        Ok(())
    }

    /// Picks `servers_path`, or the example file next to it when the former is missing.
    pub fn servers_file(&self) -> PathBuf {
        if self.servers_path.exists() {
            return self.servers_path.clone();
        }
        let example = self
            .servers_path
            .parent()
            .map(|p| p.join(EXAMPLE_SERVERS_FILE))
            .unwrap_or_else(|| PathBuf::from(EXAMPLE_SERVERS_FILE));
        if example.exists() {
            example
        } else {
            self.servers_path.clone()
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Config file not found. Run 'mcphost onboard' to set up your configuration."
            )
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_mcphost_dir()?;

    let config_path = get_config_path();
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

/// Reads the `servers:` list from a YAML file. A missing file means no servers.
pub fn load_servers(path: &Path) -> Result<Vec<ServerConfig>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No servers file, starting without servers");
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read servers from {}", path.display()))?;
    parse_servers(&content)
        .with_context(|| format!("Failed to parse servers from {}", path.display()))
}

pub fn parse_servers(content: &str) -> Result<Vec<ServerConfig>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: ServersFile = serde_yaml::from_str(content)?;
    Ok(file.servers)
}
