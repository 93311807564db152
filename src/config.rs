use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgentConfig {
    pub max_iterations: usize,
    pub auto_confirm: bool,
    pub command_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                base_url: crate::llm::mistral::DEFAULT_BASE_URL.to_string(),
                model: "mistral-small-latest".to_string(),
                api_key: None,
            },
            agent: AgentConfig {
                max_iterations: 10,
                auto_confirm: false,
                command_timeout_secs: 30,
            },
        }
    }
}

impl Config {
    /// Parse config from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load config from ~/.palisade/config.toml, falling back to defaults.
    pub fn load() -> Self {
        let config_path = if let Some(home) = dirs::home_dir() {
            home.join(".palisade").join("config.toml")
        } else {
            return Self::default();
        };

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => config,
                    Err(e) => {
                        eprintln!(
                            "Warning: Failed to parse {}: {}. Using defaults.",
                            config_path.display(),
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    eprintln!(
                        "Warning: Failed to read {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// The API key to use: the MISTRAL_API_KEY environment variable wins
    /// over the config file.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var("MISTRAL_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.llm.api_key.clone())
    }
}
