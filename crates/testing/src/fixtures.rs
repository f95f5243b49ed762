//! Test fixtures for generating domain entities with realistic data.
//!
//! Text fields come from `fake`; geography is deterministic so distance
//! ordering in tests is predictable.

use crate::builders::{IssueBuilder, UserBuilder};
use fake::{
    faker::{
        address::en::StreetName,
        lorem::en::{Paragraph, Sentence},
        name::en::Name,
    },
    Fake,
};
use civicwatch_domain::{
    geo::GeoPoint,
    identifiers::{IssueId, UserId},
    issue::{Issue, IssueCategory},
    notification::Notification,
    user::User,
};

/// Meters per degree of latitude, close enough for test offsets.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Connaught Place, New Delhi. All geo fixtures orbit this point.
pub fn delhi_center() -> GeoPoint {
    GeoPoint::new(77.2090, 28.6139).expect("fixture center is valid")
}

/// A point offset from `origin` by the given distances in meters.
///
/// Uses the small-offset approximation, which is accurate to well under a
/// meter at the scales tests use (up to tens of kilometers).
pub fn point_meters_from(origin: GeoPoint, east_meters: f64, north_meters: f64) -> GeoPoint {
    let dlat = north_meters / METERS_PER_DEGREE;
    let dlng = east_meters / (METERS_PER_DEGREE * origin.latitude().to_radians().cos());
    GeoPoint::new(origin.longitude() + dlng, origin.latitude() + dlat)
        .expect("offset stays within coordinate ranges")
}

/// Create a test citizen with a fake name
pub fn create_test_citizen() -> User {
    UserBuilder::new().with_name(Name().fake::<String>()).build()
}

/// Create a test authority with a fake department
pub fn create_test_authority() -> User {
    UserBuilder::new()
        .authority()
        .with_name(Name().fake::<String>())
        .with_department(format!("{} Department", StreetName().fake::<String>()))
        .build()
}

/// Create a test admin
pub fn create_test_admin() -> User {
    UserBuilder::new().admin().with_name(Name().fake::<String>()).build()
}

/// Create a freshly reported issue at the fixture center
pub fn create_test_issue() -> Issue {
    create_test_issue_with_category(IssueCategory::Pothole)
}

/// Create a freshly reported issue of a specific category
pub fn create_test_issue_with_category(category: IssueCategory) -> Issue {
    IssueBuilder::new()
        .with_title(Sentence(3..6).fake::<String>())
        .with_description(Paragraph(1..3).fake::<String>())
        .with_category(category)
        .at_point(delhi_center())
        .with_address(format!("{}, New Delhi", StreetName().fake::<String>()))
        .build()
}

/// Create an issue a given number of meters east of `origin`
pub fn create_test_issue_near(origin: GeoPoint, east_meters: f64) -> Issue {
    IssueBuilder::new()
        .with_title(Sentence(3..6).fake::<String>())
        .at_point(point_meters_from(origin, east_meters, 0.0))
        .build()
}

/// Create an unread notification for a recipient
pub fn create_test_notification(recipient_id: UserId) -> Notification {
    Notification::new(
        recipient_id,
        format!("Status Updated: {}", Sentence(2..4).fake::<String>()),
        Sentence(5..10).fake::<String>(),
        format!("/issues/{}", IssueId::new()),
    )
}

/// One of each role, in (citizen, authority, admin) order
pub fn create_test_roster() -> (User, User, User) {
    (
        create_test_citizen(),
        create_test_authority(),
        create_test_admin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use civicwatch_domain::issue::IssueStatus;
    use civicwatch_domain::user::UserRole;

    #[test]
    fn test_offset_points_match_haversine() {
        let center = delhi_center();

        for meters in [100.0, 1_000.0, 10_000.0] {
            let point = point_meters_from(center, meters, 0.0);
            let measured = center.distance_meters(&point);
            let relative_error = (measured - meters).abs() / meters;
            assert!(
                relative_error < 0.01,
                "offset of {meters}m measured as {measured}m"
            );
        }
    }

    #[test]
    fn test_northward_offsets_too() {
        let center = delhi_center();
        let point = point_meters_from(center, 0.0, 2_500.0);
        let measured = center.distance_meters(&point);
        assert!((measured - 2_500.0).abs() < 25.0);
    }

    #[test]
    fn test_roster_roles() {
        let (citizen, authority, admin) = create_test_roster();
        assert_eq!(citizen.role, UserRole::Citizen);
        assert_eq!(authority.role, UserRole::Authority);
        assert!(authority.department.is_some());
        assert_eq!(admin.role, UserRole::Admin);
    }

    #[test]
    fn test_fixture_issue_is_fresh() {
        let issue = create_test_issue();
        assert_eq!(issue.status, IssueStatus::Reported);
        assert!((Utc::now() - issue.created_at).num_seconds() < 5);
    }
}
