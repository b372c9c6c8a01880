use std::env;
use std::net::{IpAddr, SocketAddr};

use truths_core::DEFAULT_LEADERBOARD_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Database,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameVerification {
    /// Trust the posted payload as-is. Local development only.
    Dev,
    /// Validate signed messages against a Farcaster hub.
    Hub,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL that frame clients use to reach this server.
    pub public_url: String,
    pub database_url: String,
    pub store: StoreBackend,
    pub frame_verification: FrameVerification,
    pub hub_url: String,
    pub leaderboard_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            public_url: "http://localhost:3000".to_string(),
            database_url: "sqlite://truths.db?mode=rwc".to_string(),
            store: StoreBackend::Database,
            frame_verification: FrameVerification::Dev,
            hub_url: "https://nemes.farcaster.xyz:2281".to_string(),
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }
}

impl Config {
    /// Loads configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value })?,
            None => defaults.port,
        };

        let store = match lookup("STORE").as_deref() {
            None | Some("database") => StoreBackend::Database,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORE",
                    value: other.to_string(),
                });
            }
        };

        let frame_verification = match lookup("FRAME_VERIFICATION").as_deref() {
            None | Some("dev") => FrameVerification::Dev,
            Some("hub") => FrameVerification::Hub,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "FRAME_VERIFICATION",
                    value: other.to_string(),
                });
            }
        };

        let leaderboard_size = match lookup("LEADERBOARD_SIZE") {
            Some(value) => match value.parse::<u64>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "LEADERBOARD_SIZE",
                        value,
                    });
                }
            },
            None => defaults.leaderboard_size,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            public_url: lookup("PUBLIC_URL").unwrap_or(defaults.public_url),
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            store,
            frame_verification,
            hub_url: lookup("HUB_URL").unwrap_or(defaults.hub_url),
            leaderboard_size,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| ConfigError::Invalid {
            key: "HOST",
            value: self.host.clone(),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
