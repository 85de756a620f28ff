//! Deterministic, additive risk scoring (C3)
//!
//! Explicitly not ML-based: the score is `min(100, sum(signal.severity) * weight)`,
//! bucketed by [`RiskLevel::from_score`]. Auditable by construction — every
//! point of score traces back to one [`Signal`]. The multiplier is
//! configuration, not a hardcoded constant, but defaults to the value used
//! throughout the design notes' worked examples.

use crate::models::{RiskLevel, RiskProfile, Signal};
use crate::services::risk_signals::{SignalCollector, SignalContext};
use chrono::Utc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct RiskEngineConfig {
    /// Multiplied against the sum of matched signal severities before
    /// clamping to 0..=100.
    pub severity_weight: u32,
}

impl Default for RiskEngineConfig {
    fn default() -> Self {
        Self { severity_weight: 5 }
    }
}

pub struct RiskEngine {
    collectors: Vec<Box<dyn SignalCollector>>,
    config: RiskEngineConfig,
}

impl RiskEngine {
    pub fn new(collectors: Vec<Box<dyn SignalCollector>>, config: RiskEngineConfig) -> Self {
        Self { collectors, config }
    }

    /// Collect evidence from every registered collector and fold it into a
    /// single 0..=100 score. A collector can never fail
    /// (`SignalCollector::collect` is infallible) — risk evaluation can never
    /// itself become a source of pipeline failure.
    pub fn evaluate(&self, session_id: Uuid, ctx: &SignalContext) -> RiskProfile {
        let signals: Vec<Signal> = self
            .collectors
            .iter()
            .flat_map(|c| c.collect(ctx))
            .collect();

        let severity_sum: u32 = signals.iter().map(|s| s.severity as u32).sum();
        let score = (severity_sum * self.config.severity_weight).min(100);

        RiskProfile {
            session_id,
            subject_id: ctx.subject_id,
            score,
            level: RiskLevel::from_score(score),
            signals,
            evaluated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::risk_signals::{DeviceBindingCollector, IpReputationCollector};
    use crate::models::SignalType;

    fn ctx() -> SignalContext {
        SignalContext {
            subject_id: Uuid::new_v4(),
            current_ip: "203.0.113.9".parse().unwrap(),
            known_ips: vec!["10.0.0.1".parse().unwrap()],
            current_device: Some("device-b".to_string()),
            bound_device: Some("device-a".to_string()),
            last_seen_ip: None,
            last_seen_at: None,
            now: Utc::now(),
            recent_failed_attempts: 0,
        }
    }

    /// Mirrors the design notes' worked example: IP_ANOMALY sev=3 +
    /// DEVICE_MISMATCH sev=7 => score = min(100, (3+7)*5) = 50 => MEDIUM.
    #[test]
    fn worked_example_reaches_medium() {
        struct FixedIp;
        impl SignalCollector for FixedIp {
            fn collect(&self, ctx: &SignalContext) -> Vec<Signal> {
                vec![Signal::new(SignalType::IpAnomaly, 3, "stub")]
            }
        }
        struct FixedDevice;
        impl SignalCollector for FixedDevice {
            fn collect(&self, ctx: &SignalContext) -> Vec<Signal> {
                vec![Signal::new(SignalType::DeviceMismatch, 7, "stub")]
            }
        }
        let engine = RiskEngine::new(
            vec![Box::new(FixedIp), Box::new(FixedDevice)],
            RiskEngineConfig::default(),
        );
        let profile = engine.evaluate(Uuid::new_v4(), &ctx());
        assert_eq!(profile.score, 50);
        assert_eq!(profile.level, RiskLevel::Medium);
    }

    #[test]
    fn no_signals_stays_low() {
        let engine = RiskEngine::new(vec![Box::new(IpReputationCollector)], RiskEngineConfig::default());
        let mut c = ctx();
        c.current_ip = "10.0.0.1".parse().unwrap();
        let profile = engine.evaluate(Uuid::new_v4(), &c);
        assert_eq!(profile.score, 0);
        assert_eq!(profile.level, RiskLevel::Low);
    }

    #[test]
    fn score_never_exceeds_cap() {
        let engine = RiskEngine::new(
            vec![Box::new(IpReputationCollector), Box::new(DeviceBindingCollector)],
            RiskEngineConfig { severity_weight: 50 },
        );
        let profile = engine.evaluate(Uuid::new_v4(), &ctx());
        assert!(profile.score <= 100);
    }
}
