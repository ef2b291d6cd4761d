use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub database: u8,
}

impl RedisConfig {
    pub fn connection_string(&self) -> String {
        match &self.password {
            Some(password) => format!("redis://:{}@{}:{}/{}", password, self.host, self.port, self.database),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: u64,
    pub issuer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// Reads `key` and parses it, falling back to `default` when unset or unparsable.
pub fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Like [`env_or`] but an unset or empty variable yields `None`.
pub fn env_opt<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_connection_string() {
        let config = RedisConfig {
            enabled: true,
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            database: 4,
        };
        assert_eq!(config.connection_string(), "redis://localhost:6379/4");

        let with_password = RedisConfig {
            password: Some("secret".to_string()),
            ..config
        };
        assert_eq!(with_password.connection_string(), "redis://:secret@localhost:6379/4");
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("BOARDKEEPER_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("BOARDKEEPER_TEST_GARBAGE", 7u32), 7);
        assert_eq!(env_opt::<u32>("BOARDKEEPER_TEST_UNSET_KEY"), None);
    }
}
