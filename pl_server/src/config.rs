//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use poker_ledger::db::{DatabaseConfig, config::parse_env_or};
use std::net::{Ipv4Addr, SocketAddr};

/// Default port when neither `--bind` nor `SERVER_BIND` is set
const DEFAULT_PORT: u16 = 6969;

/// Minimum JWT secret length (128-bit security)
const MIN_JWT_SECRET_LEN: usize = 32;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Where ledger rows are kept
    pub store: StoreBackend,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Shared HS256 secret used to verify bearer tokens (required)
    pub jwt_secret: String,
}

/// Ledger store selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL via `DATABASE_URL`
    Postgres,
    /// Process-local store, lost on restart
    Memory,
}

/// Overrides taken from the command line
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub memory: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// CLI overrides win over the environment, which wins over defaults.
    ///
    /// # Errors
    ///
    /// Returns error if `JWT_SECRET` is missing or `LEDGER_STORE` is unknown
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let bind = overrides.bind.unwrap_or_else(|| {
            parse_env_or(
                "SERVER_BIND",
                SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            )
        });

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = overrides.database_url {
            database.database_url = url;
        }

        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use the signing secret of your identity provider".to_string(),
        })?;

        let store = if overrides.memory {
            StoreBackend::Memory
        } else {
            match std::env::var("LEDGER_STORE").ok().as_deref() {
                None | Some("postgres") => StoreBackend::Postgres,
                Some("memory") => StoreBackend::Memory,
                Some(other) => {
                    return Err(ConfigError::Invalid {
                        var: "LEDGER_STORE".to_string(),
                        reason: format!("Unknown store '{other}', expected postgres or memory"),
                    });
                }
            }
        };

        Ok(ServerConfig {
            bind,
            database,
            security: SecurityConfig { jwt_secret },
            store,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: format!("Must be at least {MIN_JWT_SECRET_LEN} characters"),
            });
        }

        if self.store == StoreBackend::Postgres {
            if self.database.database_url.is_empty() {
                return Err(ConfigError::Invalid {
                    var: "DATABASE_URL".to_string(),
                    reason: "Must not be empty".to_string(),
                });
            }

            if self.database.max_connections < self.database.min_connections {
                return Err(ConfigError::Invalid {
                    var: "DB_MAX_CONNECTIONS".to_string(),
                    reason: format!(
                        "Must be at least DB_MIN_CONNECTIONS ({})",
                        self.database.min_connections
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(jwt_secret: &str, store: StoreBackend) -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            database: DatabaseConfig::development(),
            security: SecurityConfig {
                jwt_secret: jwt_secret.to_string(),
            },
            store,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_config_validation_short_secret() {
        let err = config("too-short", StoreBackend::Memory)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_config_validation_pool_bounds() {
        let mut cfg = config(&"a".repeat(32), StoreBackend::Postgres);
        cfg.database.min_connections = 10;
        cfg.database.max_connections = 2;
        assert!(cfg.validate().is_err());

        // Pool settings are irrelevant without a database
        cfg.store = StoreBackend::Memory;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_config_validation_ok() {
        assert!(
            config(&"a".repeat(32), StoreBackend::Postgres)
                .validate()
                .is_ok()
        );
    }
}
