use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

pub const DEFAULT_ERROR_MESSAGE: &str = "Desculpe, ocorreu um erro. Tente novamente.";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub chat_endpoint: String,
    pub health_endpoint: String,
    /// Shown in place of a reply whenever a send fails
    pub error_message: String,
    pub max_input_lines: u16,
    pub resize_debounce_ms: u64,
    pub layout: Layout,
}

/// Which on-screen elements exist. A disabled element is simply skipped.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Layout {
    pub transcript: bool,
    pub input: bool,
    pub send_button: bool,
    pub loading_indicator: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            chat_endpoint: "/api/chat".to_string(),
            health_endpoint: "/api/health".to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            max_input_lines: 5,
            resize_debounce_ms: 100,
            layout: Layout::default(),
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            transcript: true,
            input: true,
            send_button: true,
            loading_indicator: true,
        }
    }
}

impl Config {
    /// Load from `config_path`, falling back to defaults if it is absent
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", config_path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("convai").join("config.json"))
    }

    pub fn chat_url(&self) -> String {
        join_url(&self.base_url, &self.chat_endpoint)
    }

    pub fn health_url(&self) -> String {
        join_url(&self.base_url, &self.health_endpoint)
    }
}

fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
