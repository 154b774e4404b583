use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Identity;
use crate::CoreResult;

/// What a mutating operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Add,
    Update,
    Delete,
    Checkout,
    Deliver,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Add => "ADD",
            ActionKind::Update => "UPDATE",
            ActionKind::Delete => "DELETE",
            ActionKind::Checkout => "CHECKOUT",
            ActionKind::Deliver => "DELIVER",
        }
    }
}

/// One append-only audit record. Written as a side effect of mutating
/// operations, never read back by the core. Product attributes are optional
/// because the acted-on product may already be gone by write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub display_name: String,
    pub action: ActionKind,
    pub product_key: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub price: Option<u32>,
    pub amount: Option<u32>,
}

impl AuditEntry {
    /// A fresh entry for the acting caller, product attributes unset.
    pub fn record(identity: &Identity, action: ActionKind, product_key: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            username: identity.username.clone(),
            display_name: identity.display_name.clone(),
            action,
            product_key: product_key.into(),
            category: None,
            subcategory: None,
            brand: None,
            price: None,
            amount: None,
        }
    }
}

/// Inward fire-and-forget surface. Implementations must never block and
/// must never fail the caller; a lost entry is logged and swallowed.
pub trait AuditSink: Send + Sync {
    fn append(&self, entry: AuditEntry);
}

/// Outward persistence surface the audit writer drains into.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn persist_entry(&self, entry: &AuditEntry) -> CoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::RoleTier;

    #[test]
    fn record_captures_the_acting_caller() {
        let identity = Identity::new("maria", "Maria T.", RoleTier::Base);
        let entry = AuditEntry::record(&identity, ActionKind::Checkout, "olive-oil-1l");

        assert_eq!(entry.username, "maria");
        assert_eq!(entry.display_name, "Maria T.");
        assert_eq!(entry.product_key, "olive-oil-1l");
        assert_eq!(entry.action.as_str(), "CHECKOUT");
        assert!(entry.category.is_none());
        assert!(entry.amount.is_none());
    }
}
