//! User types: the minimal slice of identity the core needs.
//!
//! Role and account status arrive as verified claims from the external
//! identity provider; the core keeps its own user records only for the fields
//! the Assignment Resolver and notification routing depend on.

use crate::identifiers::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User roles for access control
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Citizen = 0,
    Authority = 1,
    Admin = 2,
}

impl UserRole {
    pub fn all() -> &'static [UserRole] {
        &[Self::Citizen, Self::Authority, Self::Admin]
    }

    pub fn can_report_issues(&self) -> bool {
        // Every authenticated role may report
        true
    }

    pub fn can_work_issues(&self) -> bool {
        matches!(self, Self::Authority | Self::Admin)
    }

    pub fn can_assign_issues(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn can_view_all_issues(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Citizen => "Citizen",
            Self::Authority => "Authority",
            Self::Admin => "Admin",
        }
    }

    /// Stable storage/wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Authority => "authority",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown user role: {s}"))
    }
}

/// Account standing. Meaningful for authorities: only ACTIVE accounts are
/// eligible assignees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    OnLeave,
    Suspended,
}

impl AccountStatus {
    pub fn all() -> &'static [AccountStatus] {
        &[Self::Active, Self::OnLeave, Self::Suspended]
    }

    /// Stable storage/wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnLeave => "on_leave",
            Self::Suspended => "suspended",
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown account status: {s}"))
    }
}

/// A user record as the core stores it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub role: UserRole,
    pub status: AccountStatus,
    /// Department handling the authority's issues (authorities only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Geographic area the authority covers (authorities only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_area: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(display_name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: UserId::new(),
            display_name: display_name.into(),
            role,
            status: AccountStatus::Active,
            department: None,
            assigned_area: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this user can be bound to an issue by the Assignment Resolver.
    pub fn is_eligible_assignee(&self) -> bool {
        self.role == UserRole::Authority && self.status == AccountStatus::Active
    }
}
