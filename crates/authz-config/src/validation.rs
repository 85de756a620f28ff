//! Configuration validation beyond what `validator`'s derive macros express

use crate::config::{AppConfig, PolicyBackend};
use secrecy::ExposeSecret;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationErrors),

    #[error("security validation failed: {message}")]
    SecurityValidationFailed { message: String },

    #[error("database validation failed: {message}")]
    DatabaseValidationFailed { message: String },

    #[error("policy validation failed: {message}")]
    PolicyValidationFailed { message: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_config(config: &AppConfig) -> Result<(), ConfigValidationError> {
        config.validate()?;
        Self::validate_security_config(config)?;
        Self::validate_database_config(config)?;
        Self::validate_policy_config(config)?;
        Ok(())
    }

    fn validate_security_config(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.security.jwt_secret.expose_secret().len() < 32 {
            return Err(ConfigValidationError::SecurityValidationFailed {
                message: "JWT secret must be at least 32 characters long".to_string(),
            });
        }
        Ok(())
    }

    fn validate_database_config(config: &AppConfig) -> Result<(), ConfigValidationError> {
        let db = &config.database;
        if db.max_connections < db.min_connections {
            return Err(ConfigValidationError::DatabaseValidationFailed {
                message: "max_connections must be >= min_connections".to_string(),
            });
        }
        if db.max_connections > 1000 {
            return Err(ConfigValidationError::DatabaseValidationFailed {
                message: "max_connections should not exceed 1000".to_string(),
            });
        }
        Ok(())
    }

    fn validate_policy_config(config: &AppConfig) -> Result<(), ConfigValidationError> {
        let policy = &config.policy;
        match policy.backend {
            PolicyBackend::Remote if policy.remote_url.is_none() => {
                return Err(ConfigValidationError::PolicyValidationFailed {
                    message: "remote_url is required when policy.backend = remote".to_string(),
                });
            }
            PolicyBackend::Embedded if policy.embedded_script_path.is_none() => {
                return Err(ConfigValidationError::PolicyValidationFailed {
                    message: "embedded_script_path is required when policy.backend = embedded".to_string(),
                });
            }
            _ => {}
        }
        if policy.decision_cache_ttl_secs > 5 {
            return Err(ConfigValidationError::PolicyValidationFailed {
                message: "decision_cache_ttl_secs must not exceed 5s, per the cache staleness bound".to_string(),
            });
        }
        Ok(())
    }
}
