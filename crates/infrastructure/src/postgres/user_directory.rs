//! User roster persistence.

use async_trait::async_trait;
use civicwatch_application::UserDirectory;
use civicwatch_domain::{CoreError, CoreResult, User, UserId};
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{db_error, parse_stored};
use crate::database::DatabasePool;

/// PostgreSQL implementation of [`UserDirectory`].
pub struct PgUserDirectory {
    pool: PgPool,
    statement_timeout_ms: u64,
}

impl PgUserDirectory {
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

fn row_to_user(row: sqlx::postgres::PgRow) -> CoreResult<User> {
    let role: String = row.get("role");
    let status: String = row.get("status");

    Ok(User {
        id: UserId::from(row.get::<Uuid, _>("id")),
        display_name: row.get("display_name"),
        role: parse_stored(&role, "user role")?,
        status: parse_stored(&status, "account status")?,
        department: row.get("department"),
        assigned_area: row.get("assigned_area"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    #[instrument(skip(self))]
    async fn get(&self, id: UserId) -> CoreResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, display_name, role, status, department, assigned_area, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(self.err("users.get"))?;

        row.map(row_to_user).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn upsert(&self, user: &User) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, display_name, role, status, department, assigned_area, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                role = EXCLUDED.role,
                status = EXCLUDED.status,
                department = EXCLUDED.department,
                assigned_area = EXCLUDED.assigned_area
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(user.department.as_deref())
        .bind(user.assigned_area.as_deref())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(self.err("users.upsert"))?;

        debug!(user_id = %user.id, "User record upserted");
        Ok(())
    }
}
