//! Configuration file management for infragen.
//!
//! Provides a TOML-based config file at `~/.config/infragen/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use infragen_core::conversation::ContextOptions;
use infragen_core::invoker::{HttpBackendConfig, InvocationMode, SessionInvoker};
use infragen_core::validate::ValidationPolicy;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub backend: BackendSection,
    pub generation: GenerationSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<InvocationMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Prefer `INFRAGEN_API_KEY` / `OPENAI_API_KEY` over storing the key here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Existing assistant to run in session mode. Created at startup if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_assistant_chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationPolicy>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the infragen config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/infragen` or
/// `~/.config/infragen`, never the platform-specific `dirs::config_dir()`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("infragen");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("infragen")
}

/// Return the default path of the config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse a config file. Returns an error if it does not exist.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write a config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since it may hold an API key.
pub fn save_config(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values supplied on the command line; they win over everything else.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub mode: InvocationMode,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub assistant_id: Option<String>,
    pub tools: Vec<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl BackendConfig {
    /// HTTP settings for the backend clients. Fails without an API key.
    pub fn http_config(&self) -> Result<HttpBackendConfig> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!(
                "API key not found; set INFRAGEN_API_KEY or OPENAI_API_KEY, or add backend.api_key to the config file"
            );
        };
        Ok(HttpBackendConfig::new(&self.base_url, api_key).with_timeout(self.request_timeout))
    }
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub context_options: ContextOptions,
    pub validation: ValidationPolicy,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct InfragenConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub generation: GenerationConfig,
}

impl InfragenConfig {
    pub const DEFAULT_BIND: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8000;
    pub const DEFAULT_MODEL: &str = "gpt-4o";

    /// Resolve configuration from the process environment and the config
    /// file at `path` (the default location when `None`). A missing file is
    /// not an error; an unreadable or malformed one is.
    pub fn resolve(path: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
        let file = if path.exists() {
            Some(load_config(&path)?)
        } else {
            None
        };
        Self::resolve_with(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Resolve using an explicit env lookup.
    ///
    /// Chain per value: `overrides` > env var > `file` > default.
    pub fn resolve_with(
        file: Option<ConfigFile>,
        env: impl Fn(&str) -> Option<String>,
        overrides: &CliOverrides,
    ) -> Result<Self> {
        let file = file.unwrap_or_default();

        // Server.
        let bind = overrides
            .bind
            .clone()
            .or_else(|| env("INFRAGEN_BIND"))
            .or(file.server.bind)
            .unwrap_or_else(|| Self::DEFAULT_BIND.to_string());
        let port = match (overrides.port, env("INFRAGEN_PORT")) {
            (Some(port), _) => port,
            (None, Some(raw)) => raw
                .parse()
                .with_context(|| format!("INFRAGEN_PORT is not a valid port: {raw:?}"))?,
            (None, None) => file.server.port.unwrap_or(Self::DEFAULT_PORT),
        };

        // Backend.
        let mode = match env("INFRAGEN_BACKEND_MODE") {
            Some(raw) => raw
                .parse()
                .context("INFRAGEN_BACKEND_MODE is not a valid mode")?,
            None => file.backend.mode.unwrap_or_default(),
        };
        let base_url = env("INFRAGEN_BASE_URL")
            .or(file.backend.base_url)
            .unwrap_or_else(|| HttpBackendConfig::DEFAULT_BASE_URL.to_string());
        let model = env("INFRAGEN_MODEL")
            .or(file.backend.model)
            .unwrap_or_else(|| Self::DEFAULT_MODEL.to_string());
        let api_key = env("INFRAGEN_API_KEY")
            .or_else(|| env("OPENAI_API_KEY"))
            .or(file.backend.api_key);
        let assistant_id = env("INFRAGEN_ASSISTANT_ID").or(file.backend.assistant_id);
        let poll_interval = match file.backend.poll_interval_ms {
            Some(0) => bail!("backend.poll_interval_ms must be greater than zero"),
            Some(ms) => Duration::from_millis(ms),
            None => SessionInvoker::DEFAULT_POLL_INTERVAL,
        };
        let request_timeout = file
            .backend
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(HttpBackendConfig::DEFAULT_TIMEOUT);

        // Generation.
        let context_options = ContextOptions {
            max_assistant_chars: file
                .generation
                .max_assistant_chars
                .unwrap_or(ContextOptions::DEFAULT_MAX_ASSISTANT_CHARS),
            ..ContextOptions::default()
        };
        let validation = match env("INFRAGEN_VALIDATION") {
            Some(raw) => raw
                .parse()
                .context("INFRAGEN_VALIDATION is not a valid policy")?,
            None => file.generation.validation.unwrap_or_default(),
        };

        Ok(Self {
            server: ServerConfig { bind, port },
            backend: BackendConfig {
                mode,
                base_url,
                model,
                api_key,
                assistant_id,
                tools: file.backend.tools,
                poll_interval,
                request_timeout,
            },
            generation: GenerationConfig {
                context_options,
                validation,
            },
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
