//! Re-exports of the types most callers need, so `authz-api` and the other
//! crates can `use authz_core::prelude::*;` instead of reaching into each
//! submodule.

pub use crate::audit::{AuditSink, PendingAuditRecord, TracingAuditSink};
pub use crate::canonical;
pub use crate::clock::{Clock, SystemClock};
pub use crate::error::AuthzError;
pub use crate::models::*;
pub use crate::pipeline::{PipelineContext, PipelineStep, StepOutcome};
pub use crate::services::*;
