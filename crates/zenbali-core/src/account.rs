//! Account types for zenbali.
//!
//! Credential storage belongs to the authentication service. These records carry
//! only what event and payment operations read: identity, display name and the
//! active flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pagination::Pagination;
use crate::{AdminId, CreatorId, MarketError, Result};

/// An account that authors events and pays the posting fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// Creator ID.
    pub id: CreatorId,

    /// Display name.
    pub name: String,

    /// Organization the creator posts on behalf of, if any.
    pub organization_name: Option<String>,

    /// Contact email.
    pub email: String,

    /// Deactivated creators cannot manage events or pay.
    pub is_active: bool,

    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Creator {
    /// Create an active creator record.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: CreatorId::generate(),
            name: name.into(),
            organization_name: None,
            email: email.into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// Self-service profile edit. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProfileChanges {
    /// New display name. Must not be blank.
    pub name: Option<String>,
    /// New organization name. A blank value clears it.
    pub organization_name: Option<String>,
}

impl ProfileChanges {
    /// Apply the changes to `creator`.
    ///
    /// # Errors
    ///
    /// Returns `MissingField("name")` if the new name is blank. The creator is
    /// left untouched in that case.
    pub fn apply(self, creator: &mut Creator) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(MarketError::MissingField("name"));
            }
        }
        if let Some(name) = self.name {
            creator.name = name.trim().to_string();
        }
        if let Some(org) = self.organization_name {
            let org = org.trim();
            creator.organization_name = (!org.is_empty()).then(|| org.to_string());
        }
        Ok(())
    }
}

/// Query parameters for the admin creator listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreatorFilter {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

impl CreatorFilter {
    /// The normalized page window.
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}

/// A privileged account that moderates events and reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    /// Admin ID.
    pub id: AdminId,

    /// Display name.
    pub name: String,

    /// Contact email.
    pub email: String,

    /// Deactivated admins are rejected at the account gate.
    pub is_active: bool,
}

impl Admin {
    /// Create an active admin record.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: AdminId::generate(),
            name: name.into(),
            email: email.into(),
            is_active: true,
        }
    }
}

/// The authenticated party performing an event operation.
///
/// Admins bypass ownership and past-date checks; creators may act only on the
/// events they own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// A creator acting on their own events.
    Creator(CreatorId),
    /// An administrator.
    Admin(AdminId),
}

impl Actor {
    /// Whether the actor is an administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    /// Whether the actor may act on an event owned by `owner`.
    #[must_use]
    pub fn may_manage(&self, owner: CreatorId) -> bool {
        match self {
            Self::Admin(_) => true,
            Self::Creator(id) => *id == owner,
        }
    }
}
