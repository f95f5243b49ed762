//! Integration tests for the PostgreSQL stores.
//!
//! These tests require a PostgreSQL database with PostGIS and are marked
//! with #[ignore] for CI. Point DATABASE_URL at a disposable database and
//! run with: cargo test --test postgres_tests -- --ignored
//!
//! Nothing is truncated between runs: every test keeps to its own
//! reporters, recipients, and neighborhoods, so leftovers from earlier
//! runs cannot change its outcome.

use chrono::Utc;
use civicwatch_application::{
    GeoStore, IssueFilter, IssueStore, NearbyFilter, NotificationStore, UserDirectory,
};
use civicwatch_common::pagination::PageRequest;
use civicwatch_common::DatabaseSettings;
use civicwatch_domain::{
    AccountStatus, Comment, CoreError, IssueCategory, IssueError, IssueStatus, NotificationError,
    StoreError, UserId, UserRole,
};
use civicwatch_infrastructure::{
    DatabasePool, PgIssueStore, PgNotificationStore, PgUserDirectory,
};
use civicwatch_testing::{
    create_test_authority, create_test_issue_near, create_test_notification, delhi_center,
    point_meters_from, IssueBuilder,
};

async fn connect() -> DatabasePool {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must point at a disposable PostGIS-enabled database");
    let settings = DatabaseSettings {
        url,
        max_connections: 5,
        min_connections: 1,
        acquire_timeout_seconds: 5,
        statement_timeout_seconds: 30,
    };
    let db = DatabasePool::new(&settings).await.expect("database connection");
    db.run_migrations().await.expect("migrations apply cleanly");
    db
}

#[tokio::test]
#[ignore]
async fn test_issue_round_trip_preserves_collections() {
    let db = connect().await;
    let store = PgIssueStore::new(&db);

    let commenter = UserId::new();
    let issue = IssueBuilder::new()
        .with_title("Streetlight out near the metro exit")
        .with_category(IssueCategory::StreetLight)
        .with_upvotes(3)
        .with_comment(commenter, "Completely dark after 7pm")
        .build();

    store.create(&issue).await.unwrap();

    let loaded = store.get(issue.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, issue.id);
    assert_eq!(loaded.title, issue.title);
    assert_eq!(loaded.category, IssueCategory::StreetLight);
    assert_eq!(loaded.status, IssueStatus::Reported);
    assert_eq!(loaded.upvotes, 3);
    assert_eq!(loaded.comments.len(), 1);
    assert_eq!(loaded.comments[0].text, "Completely dark after 7pm");
    assert_eq!(loaded.comments[0].author, commenter);
    assert_eq!(loaded.status_history.len(), 1);
    assert_eq!(loaded.version, 0);
    // DOUBLE PRECISION columns round-trip f64 exactly.
    assert_eq!(loaded.location.point, issue.location.point);
}

#[tokio::test]
#[ignore]
async fn test_get_missing_issue_is_none() {
    let db = connect().await;
    let store = PgIssueStore::new(&db);

    let never_created = IssueBuilder::new().build();
    assert!(store.get(never_created.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_conditional_update_detects_stale_writer() {
    let db = connect().await;
    let store = PgIssueStore::new(&db);

    let issue = IssueBuilder::new().build();
    store.create(&issue).await.unwrap();

    let mut first = store.get(issue.id).await.unwrap().unwrap();
    let mut second = first.clone();

    first.assign_to(UserId::new(), Utc::now()).unwrap();
    let stored = store.update(&first).await.unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.status, IssueStatus::Assigned);

    second.assign_to(UserId::new(), Utc::now()).unwrap();
    match store.update(&second).await.unwrap_err() {
        CoreError::Store(StoreError::Conflict {
            issue_id,
            expected_version,
        }) => {
            assert_eq!(issue_id, issue.id);
            assert_eq!(expected_version, 0);
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
#[ignore]
async fn test_update_missing_issue_is_not_found() {
    let db = connect().await;
    let store = PgIssueStore::new(&db);

    let issue = IssueBuilder::new().build();
    let err = store.update(&issue).await.unwrap_err();
    assert!(matches!(err, CoreError::Issue(IssueError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_appends_survive_conditional_update() {
    let db = connect().await;
    let store = PgIssueStore::new(&db);

    let issue = IssueBuilder::new().build();
    store.create(&issue).await.unwrap();

    // A transition actor loads the issue, then appends land behind them.
    let mut snapshot = store.get(issue.id).await.unwrap().unwrap();

    let comment = Comment::new(UserId::new(), "Still broken this morning", Utc::now());
    let after_comment = store.add_comment(issue.id, &comment).await.unwrap();
    assert_eq!(after_comment.comments.len(), 1);
    assert_eq!(after_comment.version, 0, "appends must not bump the version");

    let after_upvote = store.increment_upvotes(issue.id).await.unwrap();
    assert_eq!(after_upvote.upvotes, 1);

    snapshot.assign_to(UserId::new(), Utc::now()).unwrap();
    let stored = store.update(&snapshot).await.unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.status, IssueStatus::Assigned);
    assert_eq!(stored.comments.len(), 1);
    assert_eq!(stored.comments[0].text, "Still broken this morning");
    assert_eq!(stored.upvotes, 1);
}

#[tokio::test]
#[ignore]
async fn test_comment_on_missing_issue_is_not_found() {
    let db = connect().await;
    let store = PgIssueStore::new(&db);

    let comment = Comment::new(UserId::new(), "anyone home?", Utc::now());
    let missing = IssueBuilder::new().build().id;
    let err = store.add_comment(missing, &comment).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Issue(IssueError::NotFound(id)) if id == missing
    ));
}

#[tokio::test]
#[ignore]
async fn test_list_filters_search_and_pagination() {
    let db = connect().await;
    let store = PgIssueStore::new(&db);

    // A fresh reporter id scopes this test's rows away from everything
    // else in the shared database.
    let reporter = UserId::new();
    let waterlogging = IssueBuilder::new()
        .reported_by(reporter)
        .with_title("Waterlogging under the flyover")
        .with_category(IssueCategory::Water)
        .created_hours_ago(1)
        .build();
    let fresh_pothole = IssueBuilder::new()
        .reported_by(reporter)
        .with_category(IssueCategory::Pothole)
        .created_hours_ago(2)
        .build();
    let old_pothole = IssueBuilder::new()
        .reported_by(reporter)
        .with_category(IssueCategory::Pothole)
        .created_hours_ago(3)
        .build();
    for issue in [&waterlogging, &fresh_pothole, &old_pothole] {
        store.create(issue).await.unwrap();
    }

    let base = IssueFilter {
        reported_by: Some(reporter),
        ..IssueFilter::default()
    };

    let potholes = store
        .list(
            &IssueFilter {
                category: Some(IssueCategory::Pothole),
                ..base.clone()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(potholes.total, 2);
    assert_eq!(potholes.items[0].id, fresh_pothole.id);
    assert_eq!(potholes.items[1].id, old_pothole.id);

    let by_text = store
        .list(
            &IssueFilter {
                search: Some("FLYOVER".to_string()),
                ..base.clone()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_text.total, 1);
    assert_eq!(by_text.items[0].id, waterlogging.id);

    let id = waterlogging.id.to_string();
    let by_suffix = store
        .list(
            &IssueFilter {
                search: Some(id[id.len() - 6..].to_string()),
                ..base.clone()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_suffix.total, 1);
    assert_eq!(by_suffix.items[0].id, waterlogging.id);

    let page2 = store.list(&base, PageRequest::new(2, 2)).await.unwrap();
    assert_eq!(page2.total, 3);
    assert_eq!(page2.total_pages, 2);
    assert_eq!(page2.items.len(), 1);
    assert_eq!(page2.items[0].id, old_pothole.id);
}

#[tokio::test]
#[ignore]
async fn test_query_near_ranks_by_spherical_distance() {
    let db = connect().await;
    let store = PgIssueStore::new(&db);

    // 60 km north of the fixture center, clear of other tests' geography.
    // Earlier runs may have left rows in this neighborhood, so assertions
    // are about this run's ids, not totals.
    let origin = point_meters_from(delhi_center(), 0.0, 60_000.0);
    let near = create_test_issue_near(origin, 150.0);
    let mid = create_test_issue_near(origin, 700.0);
    let far = create_test_issue_near(origin, 5_000.0);
    for issue in [&mid, &far, &near] {
        store.create(issue).await.unwrap();
    }

    let page = store
        .query_near(origin, 1_000.0, &NearbyFilter::default(), PageRequest::new(1, 100))
        .await
        .unwrap();

    let position = |id| page.items.iter().position(|hit| hit.issue.id == id);
    let near_pos = position(near.id).expect("issue 150m out is within 1km");
    let mid_pos = position(mid.id).expect("issue 700m out is within 1km");
    assert!(near_pos < mid_pos, "closer issues rank first");
    assert!(position(far.id).is_none(), "issue 5km out is beyond the radius");

    assert!((page.items[near_pos].distance_meters - 150.0).abs() < 15.0);
    assert!((page.items[mid_pos].distance_meters - 700.0).abs() < 70.0);
}

#[tokio::test]
#[ignore]
async fn test_query_near_applies_status_filter() {
    let db = connect().await;
    let store = PgIssueStore::new(&db);

    // A neighborhood of its own, away from the ranking test.
    let origin = point_meters_from(delhi_center(), 0.0, -60_000.0);
    let open = IssueBuilder::new().at_point(origin).build();
    let resolved = IssueBuilder::new().at_point(origin).resolved().build();
    store.create(&open).await.unwrap();
    store.create(&resolved).await.unwrap();

    let filter = NearbyFilter {
        category: None,
        status: Some(IssueStatus::Reported),
    };
    let page = store
        .query_near(origin, 500.0, &filter, PageRequest::new(1, 100))
        .await
        .unwrap();

    assert!(page.items.iter().any(|hit| hit.issue.id == open.id));
    assert!(page.items.iter().all(|hit| hit.issue.id != resolved.id));
}

#[tokio::test]
#[ignore]
async fn test_notification_lifecycle() {
    let db = connect().await;
    let store = PgNotificationStore::new(&db);

    let recipient = UserId::new();
    let first = create_test_notification(recipient);
    store.append(&first).await.unwrap();
    let second = create_test_notification(recipient);
    store.append(&second).await.unwrap();

    let recent = store.recent_for(recipient, 10).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, second.id, "newest first");

    let capped = store.recent_for(recipient, 1).await.unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].id, second.id);

    assert_eq!(store.unread_count(recipient).await.unwrap(), 2);

    store.mark_read(recipient, first.id).await.unwrap();
    assert_eq!(store.unread_count(recipient).await.unwrap(), 1);

    // Idempotent: marking an already-read notification stays a success.
    store.mark_read(recipient, first.id).await.unwrap();
    assert_eq!(store.unread_count(recipient).await.unwrap(), 1);

    // Another recipient cannot mark it, even with the right id.
    let err = store.mark_read(UserId::new(), second.id).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Notification(NotificationError::NotFound(_))
    ));

    store.mark_all_read(recipient).await.unwrap();
    assert_eq!(store.unread_count(recipient).await.unwrap(), 0);
    store.mark_all_read(recipient).await.unwrap();
    assert_eq!(store.unread_count(recipient).await.unwrap(), 0);
}

#[tokio::test]
#[ignore]
async fn test_user_directory_round_trip() {
    let db = connect().await;
    let directory = PgUserDirectory::new(&db);

    let mut authority = create_test_authority();
    directory.upsert(&authority).await.unwrap();

    let loaded = directory.get(authority.id).await.unwrap().unwrap();
    assert_eq!(loaded.display_name, authority.display_name);
    assert_eq!(loaded.role, UserRole::Authority);
    assert_eq!(loaded.status, AccountStatus::Active);
    assert!(loaded.department.is_some());

    authority.status = AccountStatus::Suspended;
    directory.upsert(&authority).await.unwrap();
    let reloaded = directory.get(authority.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, AccountStatus::Suspended);

    assert!(directory.get(UserId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_health_check_reports_healthy() {
    let db = connect().await;

    let health = db.health_check().await;
    assert!(health.healthy);
    assert!(health.error.is_none());
    assert!(db.stats().size >= 1);

    db.close().await;
}
