//! Issue persistence and the spatial read path.

use async_trait::async_trait;
use civicwatch_application::{
    GeoStore, IssueFilter, IssueStore, NearbyFilter, NearbyIssue, ID_SUFFIX_SEARCH_MAX_LEN,
};
use civicwatch_common::pagination::{Page, PageRequest};
use civicwatch_domain::{
    Comment, CoreError, CoreResult, GeoLocation, GeoPoint, Issue, IssueError, IssueId, StoreError,
    UserId,
};
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{db_error, escape_like, from_json, parse_stored, to_json};
use crate::database::DatabasePool;

/// PostgreSQL implementation of [`IssueStore`] and [`GeoStore`].
///
/// The issue row and its `issue_locations` entry are written in one
/// transaction, so an issue is never readable by id without being visible
/// to proximity queries, or the reverse.
pub struct PgIssueStore {
    pool: PgPool,
    statement_timeout_ms: u64,
}

impl PgIssueStore {
    pub fn new(db: &DatabasePool) -> Self {
        Self {
            pool: db.pool().clone(),
            statement_timeout_ms: db.statement_timeout_ms(),
        }
    }

    fn err(&self, operation: &'static str) -> impl Fn(sqlx::Error) -> CoreError + '_ {
        move |e| db_error(operation, self.statement_timeout_ms, e)
    }
}

/// Convert a database row to an Issue.
fn row_to_issue(row: sqlx::postgres::PgRow) -> CoreResult<Issue> {
    let point = GeoPoint::new(row.get("longitude"), row.get("latitude"))
        .map_err(|e| StoreError::Serialization(format!("stored location: {e}")))?;

    let category: String = row.get("category");
    let status: String = row.get("status");
    let priority: String = row.get("priority");

    Ok(Issue {
        id: IssueId::from(row.get::<Uuid, _>("id")),
        title: row.get("title"),
        description: row.get("description"),
        category: parse_stored(&category, "issue category")?,
        location: GeoLocation::new(point, row.get::<String, _>("address")),
        status: parse_stored(&status, "issue status")?,
        priority: parse_stored(&priority, "issue priority")?,
        reported_by: UserId::from(row.get::<Uuid, _>("reported_by")),
        assigned_to: row.get::<Option<Uuid>, _>("assigned_to").map(UserId::from),
        images: from_json(row.get("images"))?,
        upvotes: row.get::<i32, _>("upvotes") as u32,
        comments: from_json(row.get("comments"))?,
        status_history: from_json(row.get("status_history"))?,
        resolution_notes: row.get("resolution_notes"),
        resolution_images: from_json(row.get("resolution_images"))?,
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl IssueStore for PgIssueStore {
    #[instrument(skip(self, issue), fields(issue_id = %issue.id))]
    async fn create(&self, issue: &Issue) -> CoreResult<()> {
        // Both inserts commit together; a failure rolls back by dropping
        // the transaction.
        let mut tx = self.pool.begin().await.map_err(self.err("issues.create"))?;

        sqlx::query(
            r#"
            INSERT INTO issues (
                id, title, description, category, status, priority,
                reported_by, assigned_to, longitude, latitude, address,
                images, upvotes, comments, status_history,
                resolution_notes, resolution_images, version,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(issue.id.as_uuid())
        .bind(&issue.title)
        .bind(&issue.description)
        .bind(issue.category.as_str())
        .bind(issue.status.as_str())
        .bind(issue.priority.as_str())
        .bind(issue.reported_by.as_uuid())
        .bind(issue.assigned_to.map(UserId::into_uuid))
        .bind(issue.location.point.longitude())
        .bind(issue.location.point.latitude())
        .bind(&issue.location.address)
        .bind(to_json(&issue.images)?)
        .bind(issue.upvotes as i32)
        .bind(to_json(&issue.comments)?)
        .bind(to_json(&issue.status_history)?)
        .bind(issue.resolution_notes.as_deref())
        .bind(to_json(&issue.resolution_images)?)
        .bind(issue.version)
        .bind(issue.created_at)
        .bind(issue.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(self.err("issues.create"))?;

        sqlx::query(
            r#"
            INSERT INTO issue_locations (issue_id, point)
            VALUES ($1, ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography)
            "#,
        )
        .bind(issue.id.as_uuid())
        .bind(issue.location.point.longitude())
        .bind(issue.location.point.latitude())
        .execute(&mut *tx)
        .await
        .map_err(self.err("issues.create"))?;

        tx.commit().await.map_err(self.err("issues.create"))?;

        debug!(issue_id = %issue.id, "Issue created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: IssueId) -> CoreResult<Option<Issue>> {
        let row = sqlx::query(
            r#"
            SELECT
                id, title, description, category, status, priority,
                reported_by, assigned_to, longitude, latitude, address,
                images, upvotes, comments, status_history,
                resolution_notes, resolution_images, version,
                created_at, updated_at
            FROM issues
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(self.err("issues.get"))?;

        row.map(row_to_issue).transpose()
    }

    #[instrument(skip(self, issue), fields(issue_id = %issue.id, expected_version = issue.version))]
    async fn update(&self, issue: &Issue) -> CoreResult<Issue> {
        // Workflow fields only. Comments and upvotes are owned by their
        // append operations and must survive a concurrent transition.
        let row = sqlx::query(
            r#"
            UPDATE issues SET
                status = $2,
                priority = $3,
                assigned_to = $4,
                status_history = $5,
                resolution_notes = $6,
                resolution_images = $7,
                updated_at = GREATEST(updated_at, $8),
                version = version + 1
            WHERE id = $1 AND version = $9
            RETURNING
                id, title, description, category, status, priority,
                reported_by, assigned_to, longitude, latitude, address,
                images, upvotes, comments, status_history,
                resolution_notes, resolution_images, version,
                created_at, updated_at
            "#,
        )
        .bind(issue.id.as_uuid())
        .bind(issue.status.as_str())
        .bind(issue.priority.as_str())
        .bind(issue.assigned_to.map(UserId::into_uuid))
        .bind(to_json(&issue.status_history)?)
        .bind(issue.resolution_notes.as_deref())
        .bind(to_json(&issue.resolution_images)?)
        .bind(issue.updated_at)
        .bind(issue.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(self.err("issues.update"))?;

        match row {
            Some(row) => {
                debug!(issue_id = %issue.id, "Issue updated");
                row_to_issue(row)
            }
            None => {
                // Zero rows is ambiguous: the row is gone, or its version
                // moved under us. One more read tells them apart.
                let stored_version: Option<i64> =
                    sqlx::query_scalar("SELECT version FROM issues WHERE id = $1")
                        .bind(issue.id.as_uuid())
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(self.err("issues.update"))?;

                match stored_version {
                    Some(_) => Err(StoreError::Conflict {
                        issue_id: issue.id,
                        expected_version: issue.version,
                    }
                    .into()),
                    None => Err(IssueError::NotFound(issue.id).into()),
                }
            }
        }
    }

    #[instrument(skip(self, comment), fields(issue_id = %issue_id))]
    async fn add_comment(&self, issue_id: IssueId, comment: &Comment) -> CoreResult<Issue> {
        let row = sqlx::query(
            r#"
            UPDATE issues
            SET comments = comments || $2::jsonb,
                updated_at = GREATEST(updated_at, $3)
            WHERE id = $1
            RETURNING
                id, title, description, category, status, priority,
                reported_by, assigned_to, longitude, latitude, address,
                images, upvotes, comments, status_history,
                resolution_notes, resolution_images, version,
                created_at, updated_at
            "#,
        )
        .bind(issue_id.as_uuid())
        .bind(to_json(comment)?)
        .bind(comment.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(self.err("issues.add_comment"))?;

        match row {
            Some(row) => row_to_issue(row),
            None => Err(IssueError::NotFound(issue_id).into()),
        }
    }

    #[instrument(skip(self), fields(issue_id = %issue_id))]
    async fn increment_upvotes(&self, issue_id: IssueId) -> CoreResult<Issue> {
        let row = sqlx::query(
            r#"
            UPDATE issues
            SET upvotes = upvotes + 1
            WHERE id = $1
            RETURNING
                id, title, description, category, status, priority,
                reported_by, assigned_to, longitude, latitude, address,
                images, upvotes, comments, status_history,
                resolution_notes, resolution_images, version,
                created_at, updated_at
            "#,
        )
        .bind(issue_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(self.err("issues.increment_upvotes"))?;

        match row {
            Some(row) => row_to_issue(row),
            None => Err(IssueError::NotFound(issue_id).into()),
        }
    }

    #[instrument(skip(self, filter))]
    async fn list(&self, filter: &IssueFilter, page: PageRequest) -> CoreResult<Page<Issue>> {
        let offset = page.offset() as i64;
        let limit = page.limit() as i64;

        // Build dynamic WHERE clause
        let mut conditions = vec!["1=1".to_string()];
        let mut param_count = 0;

        if filter.status.is_some() {
            param_count += 1;
            conditions.push(format!("status = ${param_count}"));
        }
        if filter.category.is_some() {
            param_count += 1;
            conditions.push(format!("category = ${param_count}"));
        }
        if filter.priority.is_some() {
            param_count += 1;
            conditions.push(format!("priority = ${param_count}"));
        }
        if filter.assigned_to.is_some() {
            param_count += 1;
            conditions.push(format!("assigned_to = ${param_count}"));
        }
        if filter.reported_by.is_some() {
            param_count += 1;
            conditions.push(format!("reported_by = ${param_count}"));
        }
        if filter.created.start.is_some() {
            param_count += 1;
            conditions.push(format!("created_at >= ${param_count}"));
        }
        if filter.created.end.is_some() {
            param_count += 1;
            conditions.push(format!("created_at <= ${param_count}"));
        }

        let search_term = filter
            .search
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        if let Some(term) = &search_term {
            param_count += 1;
            let text_param = param_count;
            if term.len() <= ID_SUFFIX_SEARCH_MAX_LEN {
                param_count += 1;
                conditions.push(format!(
                    "(title ILIKE ${text_param} OR description ILIKE ${text_param} \
                     OR category LIKE ${text_param} OR id::text LIKE ${param_count})"
                ));
            } else {
                conditions.push(format!(
                    "(title ILIKE ${text_param} OR description ILIKE ${text_param} \
                     OR category LIKE ${text_param})"
                ));
            }
        }

        let where_clause = conditions.join(" AND ");

        // Count total
        let count_sql = format!("SELECT COUNT(*) FROM issues WHERE {where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(status) = filter.status {
            count_query = count_query.bind(status.as_str());
        }
        if let Some(category) = filter.category {
            count_query = count_query.bind(category.as_str());
        }
        if let Some(priority) = filter.priority {
            count_query = count_query.bind(priority.as_str());
        }
        if let Some(assigned_to) = filter.assigned_to {
            count_query = count_query.bind(assigned_to.into_uuid());
        }
        if let Some(reported_by) = filter.reported_by {
            count_query = count_query.bind(reported_by.into_uuid());
        }
        if let Some(start) = filter.created.start {
            count_query = count_query.bind(start);
        }
        if let Some(end) = filter.created.end {
            count_query = count_query.bind(end);
        }
        if let Some(term) = &search_term {
            count_query = count_query.bind(format!("%{}%", escape_like(term)));
            if term.len() <= ID_SUFFIX_SEARCH_MAX_LEN {
                count_query = count_query.bind(format!("%{}", escape_like(term)));
            }
        }

        let total: i64 = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(self.err("issues.list"))?;

        // Fetch results
        let list_sql = format!(
            r#"
            SELECT
                id, title, description, category, status, priority,
                reported_by, assigned_to, longitude, latitude, address,
                images, upvotes, comments, status_history,
                resolution_notes, resolution_images, version,
                created_at, updated_at
            FROM issues
            WHERE {where_clause}
            ORDER BY created_at DESC
            LIMIT {limit} OFFSET {offset}
            "#
        );

        let mut list_query = sqlx::query(&list_sql);
        if let Some(status) = filter.status {
            list_query = list_query.bind(status.as_str());
        }
        if let Some(category) = filter.category {
            list_query = list_query.bind(category.as_str());
        }
        if let Some(priority) = filter.priority {
            list_query = list_query.bind(priority.as_str());
        }
        if let Some(assigned_to) = filter.assigned_to {
            list_query = list_query.bind(assigned_to.into_uuid());
        }
        if let Some(reported_by) = filter.reported_by {
            list_query = list_query.bind(reported_by.into_uuid());
        }
        if let Some(start) = filter.created.start {
            list_query = list_query.bind(start);
        }
        if let Some(end) = filter.created.end {
            list_query = list_query.bind(end);
        }
        if let Some(term) = &search_term {
            list_query = list_query.bind(format!("%{}%", escape_like(term)));
            if term.len() <= ID_SUFFIX_SEARCH_MAX_LEN {
                list_query = list_query.bind(format!("%{}", escape_like(term)));
            }
        }

        let rows = list_query
            .fetch_all(&self.pool)
            .await
            .map_err(self.err("issues.list"))?;

        let mut issues = Vec::with_capacity(rows.len());
        for row in rows {
            issues.push(row_to_issue(row)?);
        }

        Ok(Page::new(issues, page, total as u64))
    }
}

#[async_trait]
impl GeoStore for PgIssueStore {
    #[instrument(skip(self, filter))]
    async fn query_near(
        &self,
        origin: GeoPoint,
        radius_meters: f64,
        filter: &NearbyFilter,
        page: PageRequest,
    ) -> CoreResult<Page<NearbyIssue>> {
        let offset = page.offset() as i64;
        let limit = page.limit() as i64;

        // use_spheroid := false keeps PostGIS on the same spherical model
        // as the in-memory haversine, so both backends rank identically.
        let mut conditions = vec![
            "ST_DWithin(l.point, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3, false)"
                .to_string(),
        ];
        let mut param_count = 3;

        if filter.category.is_some() {
            param_count += 1;
            conditions.push(format!("i.category = ${param_count}"));
        }
        if filter.status.is_some() {
            param_count += 1;
            conditions.push(format!("i.status = ${param_count}"));
        }

        let where_clause = conditions.join(" AND ");

        let count_sql = format!(
            "SELECT COUNT(*) FROM issues i \
             JOIN issue_locations l ON l.issue_id = i.id \
             WHERE {where_clause}"
        );
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(origin.longitude())
            .bind(origin.latitude())
            .bind(radius_meters);
        if let Some(category) = filter.category {
            count_query = count_query.bind(category.as_str());
        }
        if let Some(status) = filter.status {
            count_query = count_query.bind(status.as_str());
        }

        let total: i64 = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(self.err("issues.query_near"))?;

        let list_sql = format!(
            r#"
            SELECT
                i.id, i.title, i.description, i.category, i.status, i.priority,
                i.reported_by, i.assigned_to, i.longitude, i.latitude, i.address,
                i.images, i.upvotes, i.comments, i.status_history,
                i.resolution_notes, i.resolution_images, i.version,
                i.created_at, i.updated_at,
                ST_Distance(l.point, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, false)
                    AS distance_meters
            FROM issues i
            JOIN issue_locations l ON l.issue_id = i.id
            WHERE {where_clause}
            ORDER BY distance_meters ASC, i.created_at DESC
            LIMIT {limit} OFFSET {offset}
            "#
        );

        let mut list_query = sqlx::query(&list_sql)
            .bind(origin.longitude())
            .bind(origin.latitude())
            .bind(radius_meters);
        if let Some(category) = filter.category {
            list_query = list_query.bind(category.as_str());
        }
        if let Some(status) = filter.status {
            list_query = list_query.bind(status.as_str());
        }

        let rows = list_query
            .fetch_all(&self.pool)
            .await
            .map_err(self.err("issues.query_near"))?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let distance_meters: f64 = row.get("distance_meters");
            hits.push(NearbyIssue {
                issue: row_to_issue(row)?,
                distance_meters,
            });
        }

        Ok(Page::new(hits, page, total as u64))
    }
}
