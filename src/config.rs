use crate::authz::UnmanagedPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_claims_path")]
    pub claims_path: PathBuf,

    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    #[serde(default = "default_kubectl_program")]
    pub kubectl_program: String,

    #[serde(default = "default_deploy_program")]
    pub deploy_program: String,

    #[serde(default)]
    pub command_timeout_seconds: Option<u64>,

    #[serde(default)]
    pub unmanaged_commands: UnmanagedPolicy,

    #[serde(default)]
    pub block_interactive_flags: bool,

    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_claims_path() -> PathBuf {
    Config::kubegate_dir().join("roles.json")
}

fn default_project_root() -> PathBuf {
    Config::kubegate_dir().join("projects")
}

fn default_kubectl_program() -> String {
    "kubectl".to_string()
}

fn default_deploy_program() -> String {
    "whoami".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:9124".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            claims_path: default_claims_path(),
            project_root: default_project_root(),
            kubectl_program: default_kubectl_program(),
            deploy_program: default_deploy_program(),
            command_timeout_seconds: None,
            unmanaged_commands: UnmanagedPolicy::default(),
            block_interactive_flags: false,
            bind: default_bind(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&contents).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }

    pub fn config_path() -> PathBuf {
        std::env::var("KUBEGATE_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::kubegate_dir().join("config.toml"))
    }

    pub fn kubegate_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".kubegate")
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_seconds.map(Duration::from_secs)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("KUBEGATE_CLAIMS_PATH") {
            self.claims_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("KUBEGATE_PROJECT_ROOT") {
            self.project_root = PathBuf::from(path);
        }

        if let Ok(val) = std::env::var("KUBEGATE_KUBECTL_PROGRAM") {
            self.kubectl_program = val;
        }

        if let Ok(val) = std::env::var("KUBEGATE_DEPLOY_PROGRAM") {
            self.deploy_program = val;
        }

        if let Ok(val) = std::env::var("KUBEGATE_COMMAND_TIMEOUT_SECONDS") {
            if let Ok(seconds) = val.parse() {
                self.command_timeout_seconds = Some(seconds);
            }
        }

        if let Ok(val) = std::env::var("KUBEGATE_UNMANAGED_COMMANDS") {
            match val.parse::<UnmanagedPolicy>() {
                Ok(policy) => self.unmanaged_commands = policy,
                Err(e) => tracing::warn!("Ignoring KUBEGATE_UNMANAGED_COMMANDS: {}", e),
            }
        }

        if let Ok(val) = std::env::var("KUBEGATE_BLOCK_INTERACTIVE_FLAGS") {
            if let Ok(flag) = val.parse() {
                self.block_interactive_flags = flag;
            }
        }

        if let Ok(val) = std::env::var("KUBEGATE_BIND") {
            self.bind = val;
        }
    }
}

pub async fn show_config() -> Result<()> {
    let config = Config::load()?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub async fn init_config() -> Result<()> {
    let config_path = Config::config_path();

    if config_path.exists() {
        anyhow::bail!("Config file already exists at: {}", config_path.display());
    }

    let config = Config::default();
    config.save()?;

    println!("Initialized config at: {}", config_path.display());
    Ok(())
}
