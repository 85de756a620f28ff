//! Core configuration structures

use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(test)]
use proptest_derive::Arbitrary;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub security: SecurityConfig,
    pub session: SessionConfig,
    pub risk: RiskConfig,
    pub rate_limit: RateLimitConfig,
    pub policy: PolicyConfig,
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
    pub host: String,
    pub workers: Option<usize>,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub mysql_url: secrecy::Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,
    pub idle_timeout: u64,
    pub max_lifetime: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(Arbitrary))]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SecurityConfig {
    /// Shared HMAC secret the access-credential verifier checks incoming
    /// JWTs against. Minting is out of scope — this process only verifies.
    #[serde(skip_serializing)]
    pub jwt_secret: secrecy::Secret<String>,
    pub jwt_expected_audience: String,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct SessionConfig {
    /// Fixed from creation; not a sliding window (see design notes).
    #[validate(range(min = 1))]
    pub ttl_hours: i64,
    /// Safety margin added on top of `ttl_hours` for the subject session
    /// index TTL.
    pub index_safety_margin_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 8,
            index_safety_margin_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct RiskConfig {
    pub severity_weight: u32,
    pub terminate_at_or_above_score: u32,
    pub min_travel_interval_secs: i64,
    pub recent_failure_threshold: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            severity_weight: 5,
            terminate_at_or_above_score: 80,
            min_travel_interval_secs: 60,
            recent_failure_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub default_cap: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            low: 1000,
            medium: 200,
            high: 20,
            default_cap: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyBackend {
    Remote,
    Embedded,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PolicyConfig {
    pub backend: PolicyBackend,
    pub remote_url: Option<String>,
    pub remote_timeout_secs: u64,
    pub embedded_script_path: Option<String>,
    pub decision_cache_ttl_secs: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            backend: PolicyBackend::Embedded,
            remote_url: None,
            remote_timeout_secs: 5,
            embedded_script_path: Some("policies/default.rhai".to_string()),
            decision_cache_ttl_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct AuditConfig {
    pub channel_buffer_size: usize,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 4096,
            retry_max_attempts: 3,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(Arbitrary))]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub structured: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8081,
                host: "0.0.0.0".to_string(),
                workers: None,
                max_body_bytes: 100 * 1024,
            },
            database: DatabaseConfig {
                mysql_url: secrecy::Secret::new("mysql://localhost/authz".to_string()),
                max_connections: 50,
                min_connections: 5,
                connection_timeout: 30,
                idle_timeout: 300,
                max_lifetime: 1800,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                max_connections: 50,
                timeout_seconds: 5,
            },
            security: SecurityConfig {
                jwt_secret: secrecy::Secret::new("change-me-in-production-min-32-chars".to_string()),
                jwt_expected_audience: "authz-gateway".to_string(),
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            session: SessionConfig::default(),
            risk: RiskConfig::default(),
            rate_limit: RateLimitConfig::default(),
            policy: PolicyConfig::default(),
            audit: AuditConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
                structured: true,
            },
        }
    }
}
