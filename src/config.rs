use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::interpret::openai::OpenAiInterpreter;
use crate::tracker::linear::LinearClient;

pub const LINEAR_KEY_VAR: &str = "LINEAR_API_KEY";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub linear: LinearConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
}

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct LinearConfig {
    pub api_key: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tasksync")
}

fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

pub fn load_config() -> Result<AppConfig> {
    let mut config = load_config_from(&config_path())?;
    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

impl AppConfig {
    /// Non-empty environment keys take precedence over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty(LINEAR_KEY_VAR) {
            self.linear.api_key = Some(key);
        }
        if let Some(key) = non_empty(OPENAI_KEY_VAR) {
            self.openai.api_key = Some(key);
        }
    }

    pub fn linear_client(&self) -> Result<LinearClient> {
        let Some(api_key) = self.linear.api_key.clone() else {
            bail!(
                "{LINEAR_KEY_VAR} is not set. Export it or add [linear] api_key to {}",
                config_path().display()
            );
        };
        Ok(LinearClient::new(api_key, self.linear.api_url.clone()))
    }

    pub fn interpreter(&self) -> Result<OpenAiInterpreter> {
        let Some(api_key) = self.openai.api_key.clone() else {
            bail!(
                "{OPENAI_KEY_VAR} is not set. Export it, add [openai] api_key to {}, or pass --structured",
                config_path().display()
            );
        };
        let mut interpreter = OpenAiInterpreter::new(api_key);
        if let Some(url) = &self.openai.base_url {
            interpreter = interpreter.with_base_url(url.as_str());
        }
        if let Some(model) = &self.openai.model {
            interpreter = interpreter.with_model(model.as_str());
        }
        if let Some(temperature) = self.openai.temperature {
            interpreter = interpreter.with_temperature(temperature);
        }
        Ok(interpreter)
    }
}
