use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub assistant: AssistantConfig,
    pub recognition: RecognitionConfig,
    pub cadastre: CadastreConfig,
    pub usage: UsageConfig,
    pub documents: DocumentWatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: usize,
    pub max_prompt_tokens: usize,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    pub endpoint: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadastreConfig {
    pub endpoint: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    pub db_path: PathBuf,
    pub daily_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentWatchConfig {
    pub sources: Vec<String>,
    pub poll_interval_hours: u64,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "geoassist".to_string(),
                bind: "0.0.0.0".to_string(),
                port: 8080,
            },
            assistant: AssistantConfig {
                endpoint: "https://api.anthropic.com/v1/messages".to_string(),
                model: "claude-3-haiku-20240307".to_string(),
                max_tokens: 900,
                max_prompt_tokens: 4000,
                timeout_seconds: 60,
            },
            recognition: RecognitionConfig {
                endpoint: "http://127.0.0.1:9090/recognize".to_string(),
                timeout_seconds: 30,
            },
            cadastre: CadastreConfig {
                endpoint: "https://nspd.gov.ru/api/geoportal/v2/search/geoportal".to_string(),
                timeout_seconds: 30,
            },
            usage: UsageConfig {
                db_path: PathBuf::from("./data/usage.redb"),
                daily_limit: 50,
            },
            documents: DocumentWatchConfig {
                sources: Vec::new(),
                poll_interval_hours: 12,
                timeout_seconds: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "plain".to_string(),
            },
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> crate::utils::errors::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::utils::errors::GeoAssistError::ConfigError(e.to_string()))?;
        toml::from_str(&content)
            .map_err(|e| crate::utils::errors::GeoAssistError::ConfigError(e.to_string()))
    }

    pub fn load_or_default(path: Option<&str>) -> Self {
        if let Some(p) = path {
            Self::load_from_file(p).unwrap_or_default()
        } else {
            Self::default()
        }
    }
}
