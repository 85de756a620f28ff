//! Access-credential verification
//!
//! Minting the `accessToken`/`refreshToken` pair is the authentication
//! collaborator's job and out of scope here. This crate
//! only verifies: given the HMAC secret from [`authz_config`]'s
//! `SecurityConfig`, confirm an inbound JWT's signature, expiry, and
//! audience, and hand back the session id it carries.

pub mod jwt;

pub use jwt::{verify_access_token, AccessTokenClaims, JwtError};
