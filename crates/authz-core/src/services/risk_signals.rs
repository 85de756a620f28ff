//! Risk signal collection — pure, ephemeral evidence derived per request
//!
//! Nothing here touches a store. Signal collectors look at a request's
//! context and prior session state and hand back evidence; [`super::risk_engine`]
//! is the only place that turns evidence into a score.

use crate::models::{Signal, SignalType};
use chrono::{DateTime, Utc};
use std::net::IpAddr;

/// Everything a signal collector is allowed to look at. Deliberately narrow —
/// adding a field here is a decision to let every collector see it.
#[derive(Debug, Clone)]
pub struct SignalContext {
    pub subject_id: uuid::Uuid,
    pub current_ip: IpAddr,
    pub known_ips: Vec<IpAddr>,
    pub current_device: Option<String>,
    pub bound_device: Option<String>,
    pub last_seen_ip: Option<IpAddr>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
    pub recent_failed_attempts: u32,
}

/// A pure function from context to zero or more signals. Collectors are
/// independent: one collector's absence of evidence never suppresses
/// another's.
pub trait SignalCollector: Send + Sync {
    fn collect(&self, ctx: &SignalContext) -> Vec<Signal>;
}

pub struct IpReputationCollector;

impl SignalCollector for IpReputationCollector {
    fn collect(&self, ctx: &SignalContext) -> Vec<Signal> {
        if ctx.known_ips.iter().any(|ip| *ip == ctx.current_ip) {
            return Vec::new();
        }
        vec![Signal::new(
            SignalType::IpAnomaly,
            4,
            format!("request from unrecognized address {}", ctx.current_ip),
        )]
    }
}

pub struct DeviceBindingCollector;

impl SignalCollector for DeviceBindingCollector {
    fn collect(&self, ctx: &SignalContext) -> Vec<Signal> {
        match (&ctx.bound_device, &ctx.current_device) {
            (Some(bound), Some(current)) if bound != current => vec![Signal::new(
                SignalType::DeviceMismatch,
                7,
                "presented device id does not match session binding",
            )],
            _ => Vec::new(),
        }
    }
}

/// Flags a request whose IP changed since the last evaluation faster than is
/// physically plausible. A coarse heuristic: any IP change within the
/// configured minimum travel interval counts, since we don't carry
/// geolocation data in this context — true geo-velocity lives behind the
/// external risk signal collaborator described in the design notes.
pub struct ImpossibleTravelCollector {
    pub min_interval: chrono::Duration,
}

impl SignalCollector for ImpossibleTravelCollector {
    fn collect(&self, ctx: &SignalContext) -> Vec<Signal> {
        match (ctx.last_seen_ip, ctx.last_seen_at) {
            (Some(prev_ip), Some(prev_at))
                if prev_ip != ctx.current_ip && ctx.now - prev_at < self.min_interval =>
            {
                vec![Signal::new(
                    SignalType::ImpossibleTravel,
                    8,
                    format!(
                        "address changed from {} to {} within {}s",
                        prev_ip,
                        ctx.current_ip,
                        (ctx.now - prev_at).num_seconds()
                    ),
                )]
            }
            _ => Vec::new(),
        }
    }
}

pub struct RecentFailureCollector {
    pub threshold: u32,
}

impl SignalCollector for RecentFailureCollector {
    fn collect(&self, ctx: &SignalContext) -> Vec<Signal> {
        if ctx.recent_failed_attempts >= self.threshold {
            vec![Signal::new(
                SignalType::BehaviorAnomaly,
                6,
                format!("{} recent failed attempts", ctx.recent_failed_attempts),
            )]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn base_ctx() -> SignalContext {
        SignalContext {
            subject_id: Uuid::new_v4(),
            current_ip: "10.0.0.1".parse().unwrap(),
            known_ips: vec!["10.0.0.1".parse().unwrap()],
            current_device: Some("device-a".to_string()),
            bound_device: Some("device-a".to_string()),
            last_seen_ip: None,
            last_seen_at: None,
            now: Utc::now(),
            recent_failed_attempts: 0,
        }
    }

    #[test]
    fn known_ip_produces_no_signal() {
        let ctx = base_ctx();
        assert!(IpReputationCollector.collect(&ctx).is_empty());
    }

    #[test]
    fn unknown_ip_produces_signal() {
        let mut ctx = base_ctx();
        ctx.current_ip = "203.0.113.7".parse().unwrap();
        let signals = IpReputationCollector.collect(&ctx);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].signal_type, SignalType::IpAnomaly);
    }

    #[test]
    fn mismatched_device_flags_severity_seven() {
        let mut ctx = base_ctx();
        ctx.current_device = Some("device-b".to_string());
        let signals = DeviceBindingCollector.collect(&ctx);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].severity, 7);
    }

    #[test]
    fn fast_ip_change_flags_impossible_travel() {
        let mut ctx = base_ctx();
        ctx.current_ip = "198.51.100.2".parse().unwrap();
        ctx.last_seen_ip = Some("10.0.0.1".parse().unwrap());
        ctx.last_seen_at = Some(ctx.now - chrono::Duration::seconds(5));
        let collector = ImpossibleTravelCollector {
            min_interval: chrono::Duration::minutes(1),
        };
        assert_eq!(collector.collect(&ctx).len(), 1);
    }
}
