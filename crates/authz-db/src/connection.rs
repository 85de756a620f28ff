//! Database connection management

use anyhow::Result;
use authz_config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySql, MySqlPool, Pool};
use std::time::Duration;

pub async fn create_mysql_pool(config: &DatabaseConfig) -> Result<Pool<MySql>> {
    let options = config
        .mysql_url
        .expose_secret()
        .parse::<MySqlConnectOptions>()?;

    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Some(Duration::from_secs(300)))
        .max_lifetime(Some(Duration::from_secs(1800)))
        .test_before_acquire(true)
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub type DatabasePool = MySqlPool;
