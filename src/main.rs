//! Entry point for the zero-trust authorization gateway
//!
//! Wires the external collaborators (Redis for session/rate/decision state,
//! MySQL for entitlements and the audit chain, the policy engine backend)
//! into the ordered pipeline from `authz-core`, then serves it over axum.

use anyhow::{Context, Result};
use authz_api::AppState;
use authz_cache::{RedisDecisionCache, RedisRateCounter, RedisRiskHistoryStore, RedisSessionStore};
use authz_config::{ConfigLoader, ConfigValidator, PolicyBackend};
use authz_core::pipeline::steps::{
    BuildPolicyInputStep, ContinuousAccessEvaluationStep, EnforceDeviceBindingStep,
    OpaAuthorizeStep, RequireSessionStep, RiskThrottleStep,
};
use authz_core::pipeline::Pipeline;
use authz_core::services::background::audit_worker::{AsyncAuditLogger, AuditWorker};
use authz_core::services::entitlement_service::EntitlementService;
use authz_core::services::rate_limiter::{RateLimitCaps, RateLimiter};
use authz_core::services::risk_engine::{RiskEngine, RiskEngineConfig};
use authz_core::services::risk_signals::{
    DeviceBindingCollector, ImpossibleTravelCollector, IpReputationCollector,
    RecentFailureCollector, SignalCollector,
};
use authz_core::services::session_store::SessionRiskBinder;
use authz_db::{create_mysql_pool, EntitlementRepository};
use authz_platform::{shutdown_signal, PortAuthority, PortClass, PortPolicy};
use authz_policy::{CachingPolicyClient, EmbeddedPolicyClient, RemotePolicyClient};
use secrecy::ExposeSecret;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    authz_telemetry::init_telemetry().unwrap_or_else(|e| {
        eprintln!("structured telemetry init failed, continuing with default logging: {e}");
    });

    info!("starting authz-gateway");

    let environment = std::env::var("AUTHZ__ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    let config = ConfigLoader::new("config", &environment).load()?;
    ConfigValidator::validate_config(&config).context("configuration failed validation")?;
    info!(environment = %environment, "configuration loaded");

    // --- MySQL: entitlements + the hash-chained audit log ---
    let pool = create_mysql_pool(&config.database)
        .await
        .context("connecting to MySQL")?;
    sqlx::migrate!("./migrations").run(&pool).await.context("running migrations")?;
    info!("database connection established and migrated");

    let entitlement_store = Arc::new(EntitlementRepository::new(pool.clone()));
    let audit_sink: Arc<dyn authz_core::audit::AuditSink> =
        Arc::new(authz_audit::MySqlAuditSink::new(pool.clone()));

    // --- Redis: session store, rate counters, decision cache, risk history ---
    let redis_conn = authz_cache::connect(&config.redis.url)
        .await
        .context("connecting to Redis")?;
    let sessions: Arc<dyn authz_core::services::session_store::SessionStore> =
        Arc::new(RedisSessionStore::new(redis_conn.clone()));
    let risk_history: Arc<dyn authz_core::services::risk_history::RiskHistoryStore> =
        Arc::new(RedisRiskHistoryStore::new(redis_conn.clone()));
    let rate_counter = RedisRateCounter::new(redis_conn.clone());
    let decision_cache = RedisDecisionCache::new(redis_conn.clone());

    // --- Audit: bounded channel producer + durable-write consumer ---
    let (async_audit, audit_rx) = AsyncAuditLogger::new(config.audit.channel_buffer_size);
    let async_audit = Arc::new(async_audit);
    let audit_worker = AuditWorker::new(audit_rx, audit_sink);
    let audit_dead_letters = audit_worker.dead_letter_count();
    let audit_worker_handle = tokio::spawn(audit_worker.run());

    // --- Entitlements (C10) ---
    let entitlements = Arc::new(EntitlementService::new(
        entitlement_store,
        sessions.clone(),
        async_audit.clone(),
    ));

    // --- Risk engine (C2/C3) ---
    let collectors: Vec<Box<dyn SignalCollector>> = vec![
        Box::new(IpReputationCollector),
        Box::new(DeviceBindingCollector),
        Box::new(ImpossibleTravelCollector {
            min_interval: chrono::Duration::seconds(config.risk.min_travel_interval_secs),
        }),
        Box::new(RecentFailureCollector {
            threshold: config.risk.recent_failure_threshold,
        }),
    ];
    let risk_engine = Arc::new(RiskEngine::new(
        collectors,
        RiskEngineConfig {
            severity_weight: config.risk.severity_weight,
        },
    ));
    let risk_binder = SessionRiskBinder {
        terminate_at_or_above:
            authz_core::models::RiskLevel::from_score(config.risk.terminate_at_or_above_score),
    };

    // --- Rate limiter (C5) ---
    let rate_limiter = RateLimiter::new(
        rate_counter,
        RateLimitCaps {
            low: config.rate_limit.low,
            medium: config.rate_limit.medium,
            high: config.rate_limit.high,
            default_cap: config.rate_limit.default_cap,
        },
    );

    // --- Policy client (C6): remote or embedded, either way wrapped by the cache ---
    let inner_policy: Arc<dyn authz_core::services::policy_client::PolicyClient> =
        match config.policy.backend {
            PolicyBackend::Remote => {
                let url = config
                    .policy
                    .remote_url
                    .clone()
                    .context("policy.backend = remote requires policy.remote_url")?;
                Arc::new(RemotePolicyClient::new(
                    url,
                    Duration::from_secs(config.policy.remote_timeout_secs),
                )?)
            }
            PolicyBackend::Embedded => {
                let path = config
                    .policy
                    .embedded_script_path
                    .clone()
                    .context("policy.backend = embedded requires policy.embedded_script_path")?;
                Arc::new(EmbeddedPolicyClient::from_file(&path)?)
            }
        };
    let policy_client: Arc<dyn authz_core::services::policy_client::PolicyClient> = Arc::new(
        CachingPolicyClient::new(
            inner_policy,
            decision_cache,
            Duration::from_secs(config.policy.decision_cache_ttl_secs),
        ),
    );

    // --- Pipeline (C8): the ordered hook chain ---
    let pipeline = Arc::new(Pipeline::new(
        vec![
            Box::new(RequireSessionStep {
                sessions: sessions.clone(),
            }),
            Box::new(EnforceDeviceBindingStep),
            Box::new(ContinuousAccessEvaluationStep {
                engine: risk_engine,
                history: risk_history,
                sessions: sessions.clone(),
                binder: risk_binder,
            }),
            Box::new(RiskThrottleStep { limiter: rate_limiter }),
            Box::new(BuildPolicyInputStep::new()),
            Box::new(OpaAuthorizeStep { client: policy_client }),
        ],
        async_audit.clone(),
    ));

    // --- Anomaly watch (ambient, never gates a decision) ---
    // Flags abnormal growth in the audit producer-drop / dead-letter
    // counters so an operator notices queue backpressure before the DLQ
    // count alone would look alarming in isolation.
    {
        let detector = std::sync::Arc::new(authz_telemetry::AnomalyDetector::new(60, 3.0));
        let audit = async_audit.clone();
        let dead_letters = audit_dead_letters.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(10));
            loop {
                ticker.tick().await;
                detector.record("audit.dropped_at_producer", audit.dropped_count() as f64);
                detector.record(
                    "audit.dead_lettered",
                    dead_letters.load(std::sync::atomic::Ordering::Relaxed) as f64,
                );
            }
        });
    }

    let app_state = AppState {
        pipeline,
        sessions,
        entitlements,
        audit: async_audit,
        audit_dead_letters,
        jwt_secret: config.security.jwt_secret.clone(),
        jwt_audience: config.security.jwt_expected_audience.clone(),
        max_body_bytes: config.server.max_body_bytes,
    };

    let app = authz_api::app(app_state);

    // --- Port binding with OS-level safety and multi-process coordination ---
    let port_authority = PortAuthority::new()?;
    let port_policy = PortPolicy::new(config.server.port, PortClass::Public, "http")
        .with_fallback_range((config.server.port + 1)..=(config.server.port + 9));
    let managed_listener = port_authority.acquire(&port_policy, &config.server.host).await?;
    let bound_port = managed_listener.port();

    info!(host = %config.server.host, port = bound_port, "authz-gateway ready to accept connections");

    let listener = managed_listener.into_tokio_listener()?;
    axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("http listener drained, releasing port and flushing audit queue");
    if let Err(e) = port_authority.release(bound_port).await {
        tracing::warn!(error = %e, "failed to release port lease");
    }

    // `app` is fully dropped by this point, so the pipeline's and the
    // AppState's audit sender clones are gone and the channel is closed;
    // the worker drains whatever was already buffered and returns.
    match tokio::time::timeout(Duration::from_secs(10), audit_worker_handle).await {
        Ok(Ok(())) => info!("audit queue drained"),
        Ok(Err(e)) => tracing::warn!(error = %e, "audit worker task panicked"),
        Err(_) => tracing::warn!("audit queue did not drain within the shutdown grace period"),
    }

    Ok(())
}
