use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::shared::{
    errors::DomainError,
    listing::ListingBackend,
    query::{FieldKind, FieldMap, FieldSpec, FilterClause, ResidualFilter, ShapedQuery},
};
use crate::domain::user::{
    entity::{User, UserPatch},
    repository::UserRepository,
};

use super::sql::{PredicateWriter, push_order, push_window};

pub static USER_FIELDS: FieldMap = FieldMap(&[
    FieldSpec {
        name: "username",
        column: "u.username",
        kind: FieldKind::Text,
    },
    FieldSpec {
        name: "email",
        column: "u.email",
        kind: FieldKind::Text,
    },
    FieldSpec {
        name: "createdAt",
        column: "u.created_at",
        kind: FieldKind::Timestamp,
    },
]);

const USER_SELECT: &str = "SELECT u.id, u.username, u.email, u.avatar_url, u.created_at, u.updated_at, \
            ARRAY(SELECT s.blog_id FROM saved_blogs s WHERE s.user_id = u.id ORDER BY s.created_at) AS saved_blogs \
     FROM users u";

pub struct SqlxUserRepository {
    pub pool: PgPool,
}

impl SqlxUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_profile(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let sql = format!("{USER_SELECT} WHERE u.id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        self.fetch_profile(id).await
    }

    async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<(), DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");
        if let Some(username) = &patch.username {
            qb.push(", username = ").push_bind(username.clone());
        }
        if let Some(avatar_url) = &patch.avatar_url {
            qb.push(", avatar_url = ").push_bind(avatar_url.clone());
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("user".into()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("user".into()));
        }
        Ok(())
    }

    // Same dual-write shape as likes: membership row plus a denormalized
    // counter on the post, sequential and non-transactional.
    async fn save_blog(&self, user_id: Uuid, blog_id: Uuid) -> Result<User, DomainError> {
        let inserted = sqlx::query(
            "INSERT INTO saved_blogs (user_id, blog_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(blog_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;

        if inserted.rows_affected() > 0 {
            sqlx::query("UPDATE blogs SET saved_count = saved_count + 1 WHERE id = $1")
                .bind(blog_id)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        }

        self.fetch_profile(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("user".into()))
    }

    async fn unsave_blog(&self, user_id: Uuid, blog_id: Uuid) -> Result<User, DomainError> {
        let removed = sqlx::query("DELETE FROM saved_blogs WHERE user_id = $1 AND blog_id = $2")
            .bind(user_id)
            .bind(blog_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;

        if removed.rows_affected() > 0 {
            sqlx::query(
                "UPDATE blogs SET saved_count = GREATEST(0, saved_count - 1) WHERE id = $1",
            )
            .bind(blog_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        }

        self.fetch_profile(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("user".into()))
    }
}

#[async_trait]
impl ListingBackend for SqlxUserRepository {
    type Item = User;

    fn fields(&self) -> &'static FieldMap {
        &USER_FIELDS
    }

    async fn fetch(&self, query: &ShapedQuery) -> Result<Vec<User>, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new(USER_SELECT);
        let mut predicate = PredicateWriter::new();
        predicate.clauses(&mut qb, &query.scope);
        predicate.clauses(&mut qb, &query.filters);
        if let Some(term) = query.search.as_deref() {
            predicate.text_match(&mut qb, "u.search_tsv", term);
        }
        push_order(&mut qb, &query.order, " ORDER BY u.created_at DESC");
        push_window(&mut qb, query.window);

        let rows: Vec<UserRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &ResidualFilter) -> Result<i64, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)::bigint FROM users u");
        let mut predicate = PredicateWriter::new();
        predicate.clauses(&mut qb, &filter.scope);
        predicate.clauses(&mut qb, &filter.filters);
        if let Some(term) = filter.search.as_deref() {
            predicate.text_match(&mut qb, "u.search_tsv", term);
        }
        qb.build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))
    }

    async fn count_text_matches(
        &self,
        scope: &[FilterClause],
        term: &str,
    ) -> Result<i64, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)::bigint FROM users u");
        let mut predicate = PredicateWriter::new();
        predicate.clauses(&mut qb, scope);
        predicate.text_match(&mut qb, "u.search_tsv", term);
        qb.build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    saved_blogs: Vec<Uuid>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            username: r.username,
            email: r.email,
            avatar_url: r.avatar_url,
            saved_blogs: r.saved_blogs,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
