use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub attribution_window_days: i64,
    pub home_redirect_url: String,
    pub public_base_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let attribution_window_days = env_map
            .get("ATTRIBUTION_WINDOW_DAYS")
            .map(|s| s.as_str())
            .unwrap_or("7")
            .parse::<i64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "ATTRIBUTION_WINDOW_DAYS".to_string(),
                    "must be a valid i64".to_string(),
                )
            })?;
        if attribution_window_days < 1 {
            return Err(ConfigError::InvalidValue(
                "ATTRIBUTION_WINDOW_DAYS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let home_redirect_url = env_map
            .get("HOME_REDIRECT_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("HOME_REDIRECT_URL".to_string()))?;

        let public_base_url = env_map
            .get("PUBLIC_BASE_URL")
            .cloned()
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Ok(Config {
            port,
            database_path,
            attribution_window_days,
            home_redirect_url,
            public_base_url,
        })
    }
}
