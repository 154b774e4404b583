use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Ordered authorization tiers. Each tier carries every permission of the
/// tier before it, so a minimum-tier check is an ordered comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleTier {
    Base,
    Elevated,
    Full,
}

/// An authenticated caller, as produced by the identity collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub display_name: String,
    pub role: RoleTier,
}

impl Identity {
    pub fn new(username: impl Into<String>, display_name: impl Into<String>, role: RoleTier) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
            role,
        }
    }

    /// Check this caller against the minimum tier an operation allows.
    pub fn require(&self, min: RoleTier) -> CoreResult<()> {
        if self.role >= min {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "operation requires at least the {:?} tier",
                min
            )))
        }
    }
}

/// Boundary to the account/authentication collaborator: turns an opaque
/// token into a verified identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_identity(&self, token: &str) -> CoreResult<Identity>;
}

/// Token-table resolver for tests and embedded setups.
#[derive(Debug, Default)]
pub struct StaticIdentityResolver {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve_identity(&self, token: &str) -> CoreResult<Identity> {
        tracing::debug!("resolving identity token");
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| CoreError::Forbidden("unrecognized identity token".to_string()))
    }
}
