//! Database service for access-service.
//!
//! Every operation that touches access grants opens one transaction, runs
//! the lazy expiry sweep first, then performs the operation, so stale
//! Active rows can never be observed or raced against.

use crate::config::DuplicateGrantPolicy;
use crate::models::{
    Access, AccessFilter, AccessStatus, CreateAccess, CreateResource, CreateUser, Resource, User,
};
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::PgConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "access-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // User Operations
    // -------------------------------------------------------------------------

    /// List users, optionally filtered by a case-insensitive substring on
    /// name/email and by active flag.
    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        search: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, full_name, is_active
            FROM users
            WHERE ($1::varchar IS NULL
                   OR full_name ILIKE '%' || $1 || '%'
                   OR email ILIKE '%' || $1 || '%')
              AND ($2::bool IS NULL OR is_active = $2)
            ORDER BY full_name, email
            "#,
        )
        .bind(search)
        .bind(is_active)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list users: {}", e)))?;

        Ok(users)
    }

    /// Get a user by ID.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, full_name, is_active FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user: {}", e)))?;

        Ok(user)
    }

    /// Create a new user.
    ///
    /// Email duplicates are an exact, case-sensitive match on the stored
    /// value; full-name duplicates are exact as well. Both are conflicts.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: &CreateUser) -> Result<User, AppError> {
        let email_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&input.email)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to check email: {}", e))
                })?;
        if email_taken {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "A user with email '{}' already exists",
                input.email
            )));
        }

        let name_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE full_name = $1)")
                .bind(&input.full_name)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to check full name: {}", e))
                })?;
        if name_taken {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "A user named '{}' already exists",
                input.full_name
            )));
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, full_name, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, full_name, is_active
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.email)
        .bind(&input.full_name)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // Both unique indexes backstop the EXISTS checks under
            // concurrent creates.
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                match db_err.constraint() {
                    Some("idx_users_full_name") => AppError::Conflict(anyhow::anyhow!(
                        "A user named '{}' already exists",
                        input.full_name
                    )),
                    _ => AppError::Conflict(anyhow::anyhow!(
                        "A user with email '{}' already exists",
                        input.email
                    )),
                }
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create user: {}", e)),
        })?;

        info!(user_id = %user.id, "User created");

        Ok(user)
    }

    /// Partially update a user; only the active flag is mutable.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn update_user(
        &self,
        user_id: Uuid,
        is_active: Option<bool>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = COALESCE($2, is_active)
            WHERE id = $1
            RETURNING id, email, full_name, is_active
            "#,
        )
        .bind(user_id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update user: {}", e)))?;

        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Resource Operations
    // -------------------------------------------------------------------------

    /// List resources, optionally filtered by a case-insensitive substring
    /// on the name and by enabled flag.
    #[instrument(skip(self))]
    pub async fn list_resources(
        &self,
        name: Option<&str>,
        is_enabled: Option<bool>,
    ) -> Result<Vec<Resource>, AppError> {
        let resources = sqlx::query_as::<_, Resource>(
            r#"
            SELECT id, name, description, is_enabled
            FROM resources
            WHERE ($1::varchar IS NULL OR name ILIKE '%' || $1 || '%')
              AND ($2::bool IS NULL OR is_enabled = $2)
            ORDER BY name
            "#,
        )
        .bind(name)
        .bind(is_enabled)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list resources: {}", e)))?;

        Ok(resources)
    }

    /// Get a resource by ID.
    #[instrument(skip(self), fields(resource_id = %resource_id))]
    pub async fn get_resource(&self, resource_id: Uuid) -> Result<Option<Resource>, AppError> {
        let resource = sqlx::query_as::<_, Resource>(
            "SELECT id, name, description, is_enabled FROM resources WHERE id = $1",
        )
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get resource: {}", e)))?;

        Ok(resource)
    }

    /// Create a new resource. Name duplicates are case-insensitive.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_resource(&self, input: &CreateResource) -> Result<Resource, AppError> {
        let name_taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM resources WHERE LOWER(name) = LOWER($1))",
        )
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check name: {}", e)))?;
        if name_taken {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "A resource named '{}' already exists",
                input.name
            )));
        }

        let resource = sqlx::query_as::<_, Resource>(
            r#"
            INSERT INTO resources (id, name, description, is_enabled)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, is_enabled
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.is_enabled)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "A resource named '{}' already exists",
                    input.name
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create resource: {}", e)),
        })?;

        info!(resource_id = %resource.id, "Resource created");

        Ok(resource)
    }

    /// Partially update a resource; only description and enabled flag are
    /// mutable.
    #[instrument(skip(self), fields(resource_id = %resource_id))]
    pub async fn update_resource(
        &self,
        resource_id: Uuid,
        description: Option<&str>,
        is_enabled: Option<bool>,
    ) -> Result<Option<Resource>, AppError> {
        let resource = sqlx::query_as::<_, Resource>(
            r#"
            UPDATE resources
            SET description = COALESCE($2, description),
                is_enabled = COALESCE($3, is_enabled)
            WHERE id = $1
            RETURNING id, name, description, is_enabled
            "#,
        )
        .bind(resource_id)
        .bind(description)
        .bind(is_enabled)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update resource: {}", e))
        })?;

        Ok(resource)
    }

    // -------------------------------------------------------------------------
    // Access Operations
    // -------------------------------------------------------------------------

    /// Lazy expiry sweep: promote every overdue non-terminal grant to
    /// Expired in one conditional bulk update. Idempotent; touches only
    /// the status column.
    async fn sweep_expired(
        &self,
        conn: &mut PgConnection,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accesses
            SET status = 'expired'
            WHERE expires_at <= $1
              AND status NOT IN ('expired', 'revoked')
            "#,
        )
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Expiry sweep failed: {}", e)))?;

        let swept = result.rows_affected();
        if swept > 0 {
            info!(swept = swept, "Overdue grants marked expired");
        }

        Ok(swept)
    }

    /// Search access grants with conjunctive optional filters. Runs the
    /// expiry sweep first so stale Active rows never leak into results.
    #[instrument(skip(self))]
    pub async fn list_accesses(&self, filter: &AccessFilter) -> Result<Vec<Access>, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        self.sweep_expired(&mut tx, Utc::now()).await?;

        let accesses = sqlx::query_as::<_, Access>(
            r#"
            SELECT id, user_id, resource_id, granted_at, expires_at, status, comment
            FROM accesses
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR resource_id = $2)
              AND ($3::varchar IS NULL OR status = $3)
              AND ($4::timestamptz IS NULL OR expires_at <= $4)
            ORDER BY granted_at
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.resource_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.expires_before)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list accesses: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        Ok(accesses)
    }

    /// Get an access grant by ID, sweeping overdue grants first.
    #[instrument(skip(self), fields(access_id = %access_id))]
    pub async fn get_access(&self, access_id: Uuid) -> Result<Option<Access>, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        self.sweep_expired(&mut tx, Utc::now()).await?;

        let access = sqlx::query_as::<_, Access>(
            r#"
            SELECT id, user_id, resource_id, granted_at, expires_at, status, comment
            FROM accesses
            WHERE id = $1
            "#,
        )
        .bind(access_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get access: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        Ok(access)
    }

    /// Create a new access grant.
    ///
    /// The user must exist and be active, the resource must exist and be
    /// enabled, the (user, resource) pair must not already hold a grant
    /// under the configured duplicate policy, and the expiry must be
    /// strictly after the grant timestamp.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, resource_id = %input.resource_id))]
    pub async fn create_access(
        &self,
        input: &CreateAccess,
        policy: DuplicateGrantPolicy,
    ) -> Result<Access, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let now = Utc::now();
        self.sweep_expired(&mut tx, now).await?;

        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, full_name, is_active FROM users WHERE id = $1",
        )
        .bind(input.user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User {} not found", input.user_id)))?;

        if !user.is_active {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "User {} is inactive and cannot be granted access",
                user.id
            )));
        }

        let resource = sqlx::query_as::<_, Resource>(
            "SELECT id, name, description, is_enabled FROM resources WHERE id = $1",
        )
        .bind(input.resource_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get resource: {}", e)))?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Resource {} not found", input.resource_id))
        })?;

        if !resource.is_enabled {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Resource {} is disabled and cannot be granted",
                resource.id
            )));
        }

        let duplicate_sql = match policy {
            DuplicateGrantPolicy::AnyStatus => {
                "SELECT EXISTS(SELECT 1 FROM accesses WHERE user_id = $1 AND resource_id = $2)"
            }
            DuplicateGrantPolicy::ActiveOnly => {
                "SELECT EXISTS(SELECT 1 FROM accesses WHERE user_id = $1 AND resource_id = $2 AND status = 'active')"
            }
        };
        let duplicate: bool = sqlx::query_scalar(duplicate_sql)
            .bind(input.user_id)
            .bind(input.resource_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to check duplicates: {}", e))
            })?;
        if duplicate {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "User {} already holds an access grant for resource {}",
                input.user_id,
                input.resource_id
            )));
        }

        if input.expires_at <= now {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Expiry must be strictly after the grant timestamp"
            )));
        }

        let access = sqlx::query_as::<_, Access>(
            r#"
            INSERT INTO accesses (id, user_id, resource_id, granted_at, expires_at, status, comment)
            VALUES ($1, $2, $3, $4, $5, 'active', $6)
            RETURNING id, user_id, resource_id, granted_at, expires_at, status, comment
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.user_id)
        .bind(input.resource_id)
        .bind(now)
        .bind(input.expires_at)
        .bind(&input.comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            // The partial unique index on active pairs backstops the
            // duplicate check under concurrent creates.
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "User {} already holds an access grant for resource {}",
                    input.user_id,
                    input.resource_id
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create access: {}", e)),
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        info!(
            access_id = %access.id,
            expires_at = %access.expires_at,
            "Access granted"
        );

        Ok(access)
    }

    /// Apply a lifecycle transition (and/or comment update) to a grant.
    ///
    /// Only Active grants accept updates; the transition itself is
    /// validated by [`Access::plan_transition`].
    #[instrument(skip(self, expires_at, comment), fields(access_id = %access_id))]
    pub async fn update_access(
        &self,
        access_id: Uuid,
        status: Option<AccessStatus>,
        expires_at: Option<DateTime<Utc>>,
        comment: Option<&str>,
    ) -> Result<Access, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let now = Utc::now();
        self.sweep_expired(&mut tx, now).await?;

        let access = sqlx::query_as::<_, Access>(
            r#"
            SELECT id, user_id, resource_id, granted_at, expires_at, status, comment
            FROM accesses
            WHERE id = $1
            "#,
        )
        .bind(access_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get access: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Access {} not found", access_id)))?;

        // An omitted status is a pure expiry/comment update on an Active
        // grant.
        let desired = status.unwrap_or(AccessStatus::Active);
        let (new_status, new_expiry) = access
            .plan_transition(desired, expires_at, now)
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?;

        let updated = sqlx::query_as::<_, Access>(
            r#"
            UPDATE accesses
            SET status = $2,
                expires_at = $3,
                comment = COALESCE($4, comment)
            WHERE id = $1
            RETURNING id, user_id, resource_id, granted_at, expires_at, status, comment
            "#,
        )
        .bind(access_id)
        .bind(new_status.as_str())
        .bind(new_expiry)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update access: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        info!(
            from = %access.status,
            to = %updated.status,
            expires_at = %updated.expires_at,
            "Access updated"
        );

        Ok(updated)
    }
}
