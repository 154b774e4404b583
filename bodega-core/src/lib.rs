pub mod audit;
pub mod identity;

pub use audit::{ActionKind, AuditEntry, AuditSink, AuditStore};
pub use identity::{Identity, IdentityResolver, RoleTier, StaticIdentityResolver};

/// Failure taxonomy shared by every operation in the system.
///
/// NotFound, Conflict, Forbidden and Validation are produced by deliberate
/// business checks. Storage faults are translated to Internal at the store
/// boundary; raw storage errors never cross it.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
