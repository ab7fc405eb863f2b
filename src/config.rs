use crate::error::{Error, Result};

/// Process configuration, sourced from the environment with development
/// defaults. Values that fail to parse are configuration errors, not panics.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub port: u16,
    pub secure_key: String,
    pub access_token_hours: i64,
    pub verify_token_hours: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/taskdeck_development".to_string(),
            max_connections: 10,
            port: 5001,
            secure_key: "insecure-development-key".to_string(),
            access_token_hours: 24,
            verify_token_hours: 1,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database_url = db_url;
        }

        if let Ok(max_connections) = std::env::var("APP_MAX_CONNECTIONS") {
            config.max_connections = max_connections.parse().map_err(|e| {
                Error::Configuration(format!("Invalid APP_MAX_CONNECTIONS: {e}"))
            })?;
        }

        if let Ok(port) = std::env::var("APP_PORT") {
            config.port = port
                .parse()
                .map_err(|e| Error::Configuration(format!("Invalid APP_PORT: {e}")))?;
        }

        if let Ok(secure_key) = std::env::var("APP_SECURE_KEY") {
            config.secure_key = secure_key;
        }

        if let Ok(hours) = std::env::var("APP_ACCESS_TOKEN_HOURS") {
            config.access_token_hours = hours.parse().map_err(|e| {
                Error::Configuration(format!("Invalid APP_ACCESS_TOKEN_HOURS: {e}"))
            })?;
        }

        Ok(config)
    }

    /// True when the process is still running on the built-in signing key.
    pub fn uses_default_key(&self) -> bool {
        self.secure_key == AppConfig::default().secure_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_development_friendly() {
        let config = AppConfig::default();
        assert_eq!(config.port, 5001);
        assert_eq!(config.access_token_hours, 24);
        assert!(config.uses_default_key());
    }
}
