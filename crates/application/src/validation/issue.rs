//! Issue request validation rules

use super::{Validatable, ValidationResult, ValidationRules, ValidatorExt};
use civicwatch_domain::identifiers::UserId;
use civicwatch_domain::issue::{IssueCategory, IssuePriority, IssueStatus};
use civicwatch_common::DateRange;
use crate::ports::IssueFilter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// New issue report submitted by a citizen
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReportIssueRequest {
    #[validate(length(max = 200, message = "Title must be 200 characters or less"))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description must be 5000 characters or less"))]
    pub description: String,
    pub category: IssueCategory,
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    #[validate(length(max = 500, message = "Address must be 500 characters or less"))]
    pub address: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ReportIssueRequest {
    pub const MAX_IMAGES: usize = 10;
}

impl Validatable for ReportIssueRequest {
    fn validate_all(&self) -> ValidationResult {
        let mut result = self.to_validation_result();

        if self.title.trim().is_empty() {
            result.add_field_error("title", "Title is required");
        }
        if self.description.trim().is_empty() {
            result.add_field_error("description", "Description is required");
        }

        result.merge(ValidationRules::validate_coordinates(
            self.longitude,
            self.latitude,
        ));

        result.merge(ValidationRules::validate_list_size(
            &self.images,
            "images",
            None,
            Some(Self::MAX_IMAGES),
        ));
        for image in &self.images {
            result.merge(ValidationRules::validate_url(image, "images"));
        }

        result
    }
}

/// Comment posted on an existing issue
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(max = 1000, message = "Comment must be 1000 characters or less"))]
    pub text: String,
}

impl Validatable for AddCommentRequest {
    fn validate_all(&self) -> ValidationResult {
        let mut result = self.to_validation_result();

        if self.text.trim().is_empty() {
            result.add_field_error("text", "Comment text is required");
        }

        result
    }
}

/// Workflow transition requested by the assigned authority or an admin
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangeStatusRequest {
    pub status: IssueStatus,
    #[validate(length(max = 2000, message = "Notes must be 2000 characters or less"))]
    pub notes: Option<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl ChangeStatusRequest {
    pub const MAX_EVIDENCE_IMAGES: usize = 10;
}

impl Validatable for ChangeStatusRequest {
    fn validate_all(&self) -> ValidationResult {
        let mut result = self.to_validation_result();

        result.merge(ValidationRules::validate_list_size(
            &self.evidence,
            "evidence",
            None,
            Some(Self::MAX_EVIDENCE_IMAGES),
        ));
        for image in &self.evidence {
            result.merge(ValidationRules::validate_url(image, "evidence"));
        }

        result
    }
}

/// Routing decision binding an issue to an authority
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignIssueRequest {
    pub authority_id: UserId,
}

/// Proximity feed query parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius: Option<f64>,
    pub category: Option<IssueCategory>,
    pub status: Option<IssueStatus>,
}

impl NearbyQuery {
    pub const DEFAULT_RADIUS_METERS: f64 = 2_000.0;
    pub const MAX_RADIUS_METERS: f64 = 50_000.0;

    /// Requested radius, defaulted and clamped to the server maximum.
    pub fn effective_radius(&self) -> f64 {
        self.radius
            .unwrap_or(Self::DEFAULT_RADIUS_METERS)
            .min(Self::MAX_RADIUS_METERS)
    }
}

impl Validatable for NearbyQuery {
    fn validate_all(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        result.merge(ValidationRules::validate_coordinates(self.lng, self.lat));

        if let Some(radius) = self.radius {
            if !radius.is_finite() || radius <= 0.0 {
                result.add_field_error("radius", "Radius must be a positive number of meters");
            }
        }

        result
    }
}

/// Authority work-queue filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueQuery {
    pub status: Option<IssueStatus>,
    pub category: Option<IssueCategory>,
    pub priority: Option<IssuePriority>,
}

impl QueueQuery {
    pub fn to_filter(&self, authority_id: UserId) -> IssueFilter {
        IssueFilter {
            status: self.status,
            category: self.category,
            priority: self.priority,
            assigned_to: Some(authority_id),
            ..IssueFilter::default()
        }
    }
}

/// Admin oversight-board filters: queue filters plus search and a date window
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AdminListQuery {
    pub status: Option<IssueStatus>,
    pub category: Option<IssueCategory>,
    pub priority: Option<IssuePriority>,
    #[validate(length(max = 100, message = "Search term must be 100 characters or less"))]
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl AdminListQuery {
    pub fn to_filter(&self) -> IssueFilter {
        let search = self
            .search
            .as_ref()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        IssueFilter {
            status: self.status,
            category: self.category,
            priority: self.priority,
            search,
            created: DateRange::new(self.from, self.to),
            ..IssueFilter::default()
        }
    }
}

impl Validatable for AdminListQuery {
    fn validate_all(&self) -> ValidationResult {
        let mut result = self.to_validation_result();

        if let Err(message) = DateRange::new(self.from, self.to).validate() {
            result.add_field_error("from", message);
        }

        result
    }
}
