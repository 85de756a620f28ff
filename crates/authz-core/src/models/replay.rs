//! Anti-replay nonce record — hashed, never stored in plaintext

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ReplayNonce {
    /// sha256(nonce), hex-encoded
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
