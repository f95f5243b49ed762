//! Assignment resolution
//!
//! Binds issues to municipal authorities. Only admins route work, and only
//! active authority accounts may receive it. Reassignment keeps the issue's
//! status and progress; the audit trail and the previous authority both
//! record the handover.

use crate::authz::{authorize, Action};
use crate::context::ActorContext;
use crate::ports::{IssueStore, UserDirectory};
use crate::services::NotificationService;
use crate::validation::AssignIssueRequest;
use chrono::Utc;
use civicwatch_domain::user::{AccountStatus, UserRole};
use civicwatch_domain::{
    AssignmentError, CoreResult, Issue, IssueError, IssueEvent, IssueId, UserError,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Admin-driven routing of issues to authorities.
pub struct AssignmentService {
    issues: Arc<dyn IssueStore>,
    users: Arc<dyn UserDirectory>,
    notifications: Arc<NotificationService>,
}

impl AssignmentService {
    pub fn new(
        issues: Arc<dyn IssueStore>,
        users: Arc<dyn UserDirectory>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            issues,
            users,
            notifications,
        }
    }

    /// Bind an issue to an authority. First assignment moves REPORTED to
    /// ASSIGNED; a reassignment keeps the current status and progress. The
    /// write is conditional on the loaded version, so an assignment racing a
    /// transition surfaces as a conflict.
    #[instrument(skip(self, actor, request), fields(correlation_id = %actor.correlation_id))]
    pub async fn assign(
        &self,
        actor: &ActorContext,
        issue_id: IssueId,
        request: AssignIssueRequest,
    ) -> CoreResult<Issue> {
        authorize(actor, &Action::AssignIssue)?;

        let authority = self
            .users
            .get(request.authority_id)
            .await?
            .ok_or(UserError::NotFound(request.authority_id))?;

        if !authority.is_eligible_assignee() {
            if authority.role != UserRole::Authority {
                return Err(AssignmentError::NotAnAuthority {
                    authority_id: authority.id,
                }
                .into());
            }
            debug_assert_ne!(authority.status, AccountStatus::Active);
            return Err(AssignmentError::AuthorityNotActive {
                authority_id: authority.id,
                status: authority.status,
            }
            .into());
        }

        let mut issue = self
            .issues
            .get(issue_id)
            .await?
            .ok_or(IssueError::NotFound(issue_id))?;

        let previous_authority = issue.assigned_to.filter(|p| *p != authority.id);

        issue.assign_to(authority.id, Utc::now())?;
        let stored = self.issues.update(&issue).await?;

        info!(
            issue_id = %stored.id,
            authority_id = %authority.id,
            reassignment = previous_authority.is_some(),
            "Issue assigned"
        );

        let event = IssueEvent::IssueAssigned {
            issue_id: stored.id,
            title: stored.title.clone(),
            authority_id: authority.id,
            assigned_by: actor.user_id,
            reported_by: stored.reported_by,
            previous_authority,
        };
        if let Err(err) = self.notifications.dispatch(&event).await {
            warn!(
                issue_id = %stored.id,
                error = %err,
                "Notification dispatch failed"
            );
        }

        Ok(stored)
    }
}
