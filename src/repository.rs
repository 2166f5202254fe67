use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    models::{
        Complaint, ComplaintFilter, ComplaintStatus, GovWebData, NewComplaint, NewGovWebData,
        NewUser, User,
    },
    pagination::PageRequest,
};

/// Persistence failures. Callers surface these as internal errors.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Repository Trait
///
/// The abstract contract for all persistence operations: the Credential Store,
/// the Complaint Store and the government web directory. Handlers and the
/// complaint service only ever see `Arc<dyn Repository>`.
///
/// Single-record writes follow "find, mutate, save": concurrent edits of the
/// same record are last-writer-wins.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Credential Store ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    // --- Complaint Store ---
    async fn insert_complaint(&self, complaint: NewComplaint) -> Result<Complaint, RepositoryError>;
    async fn get_complaint(&self, id: Uuid) -> Result<Option<Complaint>, RepositoryError>;
    /// Lists complaints newest first. `owner` restricts the scope to one user;
    /// `page` of `None` returns every match. Also returns the total match count.
    async fn list_complaints(
        &self,
        owner: Option<Uuid>,
        filter: &ComplaintFilter,
        page: Option<PageRequest>,
    ) -> Result<(Vec<Complaint>, u64), RepositoryError>;
    /// Persists content, image and status. The owner column is never written.
    /// Returns `None` when the record vanished in the meantime.
    async fn save_complaint(&self, complaint: &Complaint)
    -> Result<Option<Complaint>, RepositoryError>;
    async fn delete_complaint(&self, id: Uuid) -> Result<bool, RepositoryError>;

    // --- Government Web Directory ---
    async fn list_gov_web_data(&self) -> Result<Vec<GovWebData>, RepositoryError>;
    async fn get_gov_web_data(&self, id: Uuid) -> Result<Option<GovWebData>, RepositoryError>;
    async fn find_gov_web_data_by_url(
        &self,
        website_url: &str,
    ) -> Result<Option<GovWebData>, RepositoryError>;
    async fn insert_gov_web_data(&self, data: NewGovWebData)
    -> Result<GovWebData, RepositoryError>;
    async fn save_gov_web_data(
        &self,
        data: &GovWebData,
    ) -> Result<Option<GovWebData>, RepositoryError>;
    async fn delete_gov_web_data(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Escapes LIKE wildcards so the search term is matched literally.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// PostgresRepository
///
/// The concrete implementation backed by PostgreSQL. Queries are checked at
/// runtime so the crate builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.into()))
    }
}

/// Appends the ownership scope and filter predicates shared by the listing and
/// count queries. Search covers the whitelisted text fields and the status.
fn push_complaint_predicates(
    builder: &mut QueryBuilder<'_, Postgres>,
    owner: Option<Uuid>,
    filter: &ComplaintFilter,
) {
    if let Some(owner) = owner {
        builder.push(" AND user_id = ");
        builder.push_bind(owner);
    }

    if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
        let pattern = like_pattern(term.trim());
        builder.push(" AND (subject ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR description ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR category ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR status::text ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(subject) = &filter.subject {
        builder.push(" AND lower(subject) = lower(");
        builder.push_bind(subject.clone());
        builder.push(")");
    }

    if let Some(category) = &filter.category {
        builder.push(" AND lower(category) = lower(");
        builder.push_bind(category.clone());
        builder.push(")");
    }

    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, role, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, role, created_at, updated_at \
             FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) \
             RETURNING id, username, email, password_hash, role, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// insert_complaint
    ///
    /// New complaints always enter the workflow as `pending`.
    async fn insert_complaint(&self, complaint: NewComplaint) -> Result<Complaint, RepositoryError> {
        let created = sqlx::query_as::<_, Complaint>(
            "INSERT INTO complaints \
                (id, user_id, subject, description, category, image, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW()) \
             RETURNING id, user_id, subject, description, category, image, status, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(complaint.user_id)
        .bind(complaint.subject)
        .bind(complaint.description)
        .bind(complaint.category)
        .bind(complaint.image)
        .bind(ComplaintStatus::Pending)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_complaint(&self, id: Uuid) -> Result<Option<Complaint>, RepositoryError> {
        let complaint = sqlx::query_as::<_, Complaint>(
            "SELECT id, user_id, subject, description, category, image, status, created_at, updated_at \
             FROM complaints WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(complaint)
    }

    /// list_complaints
    ///
    /// Builds the filter with `QueryBuilder` so every user-supplied value is bound,
    /// never interpolated.
    async fn list_complaints(
        &self,
        owner: Option<Uuid>,
        filter: &ComplaintFilter,
        page: Option<PageRequest>,
    ) -> Result<(Vec<Complaint>, u64), RepositoryError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, user_id, subject, description, category, image, status, created_at, updated_at \
             FROM complaints WHERE TRUE",
        );
        push_complaint_predicates(&mut builder, owner, filter);
        builder.push(" ORDER BY created_at DESC, id DESC");

        if let Some(page) = page {
            builder.push(" LIMIT ");
            builder.push_bind(i64::from(page.limit));
            builder.push(" OFFSET ");
            builder.push_bind(page.offset() as i64);
        }

        let rows = builder
            .build_query_as::<Complaint>()
            .fetch_all(&self.pool)
            .await?;

        let total = match page {
            None => rows.len() as u64,
            Some(_) => {
                let mut counter: QueryBuilder<Postgres> =
                    QueryBuilder::new("SELECT COUNT(*) FROM complaints WHERE TRUE");
                push_complaint_predicates(&mut counter, owner, filter);
                let count: i64 = counter
                    .build_query_scalar::<i64>()
                    .fetch_one(&self.pool)
                    .await?;
                count.max(0) as u64
            }
        };

        Ok((rows, total))
    }

    async fn save_complaint(
        &self,
        complaint: &Complaint,
    ) -> Result<Option<Complaint>, RepositoryError> {
        let saved = sqlx::query_as::<_, Complaint>(
            "UPDATE complaints \
             SET subject = $2, description = $3, category = $4, image = $5, status = $6, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, user_id, subject, description, category, image, status, created_at, updated_at",
        )
        .bind(complaint.id)
        .bind(&complaint.subject)
        .bind(&complaint.description)
        .bind(&complaint.category)
        .bind(&complaint.image)
        .bind(complaint.status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete_complaint(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM complaints WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_gov_web_data(&self) -> Result<Vec<GovWebData>, RepositoryError> {
        let rows = sqlx::query_as::<_, GovWebData>(
            "SELECT id, name, description, address, website_url, image_url, created_at, updated_at \
             FROM gov_web_data ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_gov_web_data(&self, id: Uuid) -> Result<Option<GovWebData>, RepositoryError> {
        let row = sqlx::query_as::<_, GovWebData>(
            "SELECT id, name, description, address, website_url, image_url, created_at, updated_at \
             FROM gov_web_data WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_gov_web_data_by_url(
        &self,
        website_url: &str,
    ) -> Result<Option<GovWebData>, RepositoryError> {
        let row = sqlx::query_as::<_, GovWebData>(
            "SELECT id, name, description, address, website_url, image_url, created_at, updated_at \
             FROM gov_web_data WHERE lower(website_url) = lower($1)",
        )
        .bind(website_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_gov_web_data(
        &self,
        data: NewGovWebData,
    ) -> Result<GovWebData, RepositoryError> {
        let row = sqlx::query_as::<_, GovWebData>(
            "INSERT INTO gov_web_data \
                (id, name, description, address, website_url, image_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) \
             RETURNING id, name, description, address, website_url, image_url, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(data.name)
        .bind(data.description)
        .bind(data.address)
        .bind(data.website_url)
        .bind(data.image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save_gov_web_data(
        &self,
        data: &GovWebData,
    ) -> Result<Option<GovWebData>, RepositoryError> {
        let row = sqlx::query_as::<_, GovWebData>(
            "UPDATE gov_web_data \
             SET name = $2, description = $3, address = $4, website_url = $5, image_url = $6, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, name, description, address, website_url, image_url, created_at, updated_at",
        )
        .bind(data.id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.address)
        .bind(&data.website_url)
        .bind(&data.image_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_gov_web_data(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM gov_web_data WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// --- In-Memory Implementation ---

/// MemoryRepository
///
/// A process-local implementation of `Repository` used by the test suites and
/// for running the API without Postgres. Complaints are kept in insertion order.
#[derive(Default)]
pub struct MemoryRepository {
    users: RwLock<HashMap<Uuid, User>>,
    complaints: RwLock<Vec<Complaint>>,
    gov_web_data: RwLock<HashMap<Uuid, GovWebData>>,
    offline: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a store outage: while set, every call fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// In-memory counterpart of `push_complaint_predicates`.
fn complaint_matches(complaint: &Complaint, owner: Option<Uuid>, filter: &ComplaintFilter) -> bool {
    if owner.is_some_and(|owner| complaint.user_id != owner) {
        return false;
    }

    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let term = term.to_lowercase();
        let hit = contains_ignore_case(&complaint.subject, &term)
            || contains_ignore_case(&complaint.description, &term)
            || contains_ignore_case(&complaint.category, &term)
            || complaint.status.as_str().contains(&term);
        if !hit {
            return false;
        }
    }

    if let Some(subject) = &filter.subject {
        if !complaint.subject.eq_ignore_ascii_case(subject) {
            return false;
        }
    }

    if let Some(category) = &filter.category {
        if !complaint.category.eq_ignore_ascii_case(category) {
            return false;
        }
    }

    filter.status.is_none_or(|status| complaint.status == status)
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        self.check_online()?;
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.check_online()?;
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.check_online()?;
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        self.users.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn insert_complaint(&self, complaint: NewComplaint) -> Result<Complaint, RepositoryError> {
        self.check_online()?;
        let now = Utc::now();
        let created = Complaint {
            id: Uuid::new_v4(),
            user_id: complaint.user_id,
            subject: complaint.subject,
            description: complaint.description,
            category: complaint.category,
            image: complaint.image,
            status: ComplaintStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.complaints.write().await.push(created.clone());
        Ok(created)
    }

    async fn get_complaint(&self, id: Uuid) -> Result<Option<Complaint>, RepositoryError> {
        self.check_online()?;
        Ok(self
            .complaints
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_complaints(
        &self,
        owner: Option<Uuid>,
        filter: &ComplaintFilter,
        page: Option<PageRequest>,
    ) -> Result<(Vec<Complaint>, u64), RepositoryError> {
        self.check_online()?;
        // Reverse insertion order first so equal timestamps still list newest first.
        let mut matches: Vec<Complaint> = self
            .complaints
            .read()
            .await
            .iter()
            .rev()
            .filter(|c| complaint_matches(c, owner, filter))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len() as u64;
        let rows = match page {
            None => matches,
            Some(page) => matches
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit as usize)
                .collect(),
        };
        Ok((rows, total))
    }

    async fn save_complaint(
        &self,
        complaint: &Complaint,
    ) -> Result<Option<Complaint>, RepositoryError> {
        self.check_online()?;
        let mut complaints = self.complaints.write().await;
        let Some(stored) = complaints.iter_mut().find(|c| c.id == complaint.id) else {
            return Ok(None);
        };
        stored.subject = complaint.subject.clone();
        stored.description = complaint.description.clone();
        stored.category = complaint.category.clone();
        stored.image = complaint.image.clone();
        stored.status = complaint.status;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete_complaint(&self, id: Uuid) -> Result<bool, RepositoryError> {
        self.check_online()?;
        let mut complaints = self.complaints.write().await;
        let before = complaints.len();
        complaints.retain(|c| c.id != id);
        Ok(complaints.len() < before)
    }

    async fn list_gov_web_data(&self) -> Result<Vec<GovWebData>, RepositoryError> {
        self.check_online()?;
        let mut rows: Vec<GovWebData> = self.gov_web_data.read().await.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn get_gov_web_data(&self, id: Uuid) -> Result<Option<GovWebData>, RepositoryError> {
        self.check_online()?;
        Ok(self.gov_web_data.read().await.get(&id).cloned())
    }

    async fn find_gov_web_data_by_url(
        &self,
        website_url: &str,
    ) -> Result<Option<GovWebData>, RepositoryError> {
        self.check_online()?;
        Ok(self
            .gov_web_data
            .read()
            .await
            .values()
            .find(|d| d.website_url.eq_ignore_ascii_case(website_url))
            .cloned())
    }

    async fn insert_gov_web_data(
        &self,
        data: NewGovWebData,
    ) -> Result<GovWebData, RepositoryError> {
        self.check_online()?;
        let now = Utc::now();
        let row = GovWebData {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            address: data.address,
            website_url: data.website_url,
            image_url: data.image_url,
            created_at: now,
            updated_at: now,
        };
        self.gov_web_data.write().await.insert(row.id, row.clone());
        Ok(row)
    }

    async fn save_gov_web_data(
        &self,
        data: &GovWebData,
    ) -> Result<Option<GovWebData>, RepositoryError> {
        self.check_online()?;
        let mut rows = self.gov_web_data.write().await;
        let Some(stored) = rows.get_mut(&data.id) else {
            return Ok(None);
        };
        let created_at = stored.created_at;
        *stored = GovWebData {
            created_at,
            updated_at: Utc::now(),
            ..data.clone()
        };
        Ok(Some(stored.clone()))
    }

    async fn delete_gov_web_data(&self, id: Uuid) -> Result<bool, RepositoryError> {
        self.check_online()?;
        Ok(self.gov_web_data.write().await.remove(&id).is_some())
    }
}
