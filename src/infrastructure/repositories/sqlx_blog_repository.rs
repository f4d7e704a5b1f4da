use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::blog::{
    entity::{Author, Blog, BlogPatch, CategoryRef, NewBlog},
    repository::BlogRepository,
};
use crate::domain::shared::{
    errors::DomainError,
    listing::ListingBackend,
    query::{FieldKind, FieldMap, FieldSpec, FilterClause, FilterValue, ResidualFilter, ShapedQuery},
};

use super::sql::{PredicateWriter, push_order, push_window};

/// Fields of the blogs collection exposed to sort and filter parameters.
pub static BLOG_FIELDS: FieldMap = FieldMap(&[
    FieldSpec {
        name: "title",
        column: "b.title",
        kind: FieldKind::Text,
    },
    FieldSpec {
        name: "description",
        column: "b.description",
        kind: FieldKind::Text,
    },
    FieldSpec {
        name: "user",
        column: "b.user_id",
        kind: FieldKind::Uuid,
    },
    FieldSpec {
        name: "category",
        column: "b.category_id",
        kind: FieldKind::Uuid,
    },
    FieldSpec {
        name: "createdAt",
        column: "b.created_at",
        kind: FieldKind::Timestamp,
    },
    FieldSpec {
        name: "updatedAt",
        column: "b.updated_at",
        kind: FieldKind::Timestamp,
    },
]);

const BLOG_SELECT: &str = "SELECT b.id, b.title, b.description, b.content, b.image_url, \
            b.created_at, b.updated_at, \
            u.id AS author_id, u.username AS author_username, u.email AS author_email, \
            u.avatar_url AS author_avatar_url, \
            c.id AS cat_id, c.name AS cat_name, \
            ARRAY(SELECT l.user_id FROM blog_likes l WHERE l.blog_id = b.id ORDER BY l.created_at) AS likes \
     FROM blogs b \
     LEFT JOIN users u ON u.id = b.user_id \
     LEFT JOIN categories c ON c.id = b.category_id";

const BLOG_COUNT: &str = "SELECT COUNT(*)::bigint FROM blogs b";

pub struct SqlxBlogRepository {
    pub pool: PgPool,
}

impl SqlxBlogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn scope_all() -> Vec<FilterClause> {
        Vec::new()
    }

    pub fn scope_by_user(user_id: Uuid) -> Vec<FilterClause> {
        vec![FilterClause::eq("b.user_id", FilterValue::Uuid(user_id))]
    }

    pub fn scope_by_category(category_id: Uuid) -> Vec<FilterClause> {
        vec![FilterClause::eq("b.category_id", FilterValue::Uuid(category_id))]
    }

    /// Restrict the listing to an explicit set of posts (saved blogs).
    pub fn scope_within(ids: Vec<Uuid>) -> Vec<FilterClause> {
        vec![FilterClause::within("b.id", ids)]
    }

    async fn fetch_populated(&self, id: Uuid) -> Result<Option<Blog>, DomainError> {
        let sql = format!("{BLOG_SELECT} WHERE b.id = $1");
        let row = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn create(&self, blog: &NewBlog) -> Result<Blog, DomainError> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO blogs (id, user_id, category_id, title, description, content, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(blog.user_id)
        .bind(blog.category_id)
        .bind(&blog.title)
        .bind(&blog.description)
        .bind(&blog.content)
        .bind(blog.image_url.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;

        self.fetch_populated(id)
            .await?
            .ok_or_else(|| DomainError::InfrastructureError("created blog vanished".into()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Blog>, DomainError> {
        self.fetch_populated(id).await
    }

    async fn update(&self, id: Uuid, patch: &BlogPatch) -> Result<(), DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE blogs SET updated_at = NOW()");
        if let Some(title) = &patch.title {
            qb.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(content) = &patch.content {
            qb.push(", content = ").push_bind(content.clone());
        }
        if let Some(image_url) = &patch.image_url {
            qb.push(", image_url = ").push_bind(image_url.clone());
        }
        if let Some(category_id) = patch.category_id {
            qb.push(", category_id = ").push_bind(category_id);
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("blog".into()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("blog".into()));
        }
        Ok(())
    }

    // Like state lives in two places: the membership row and the denormalized
    // counter on the post. The writes are sequential and non-transactional;
    // a crash between them leaves the counter stale (see DESIGN.md).
    async fn add_like(&self, blog_id: Uuid, user_id: Uuid) -> Result<Blog, DomainError> {
        let inserted = sqlx::query(
            "INSERT INTO blog_likes (blog_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(blog_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;

        if inserted.rows_affected() > 0 {
            sqlx::query("UPDATE blogs SET likes_count = likes_count + 1 WHERE id = $1")
                .bind(blog_id)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        }

        self.fetch_populated(blog_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("blog".into()))
    }

    async fn remove_like(&self, blog_id: Uuid, user_id: Uuid) -> Result<Blog, DomainError> {
        let removed = sqlx::query("DELETE FROM blog_likes WHERE blog_id = $1 AND user_id = $2")
            .bind(blog_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;

        if removed.rows_affected() > 0 {
            sqlx::query(
                "UPDATE blogs SET likes_count = GREATEST(0, likes_count - 1) WHERE id = $1",
            )
            .bind(blog_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        }

        self.fetch_populated(blog_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("blog".into()))
    }
}

#[async_trait]
impl ListingBackend for SqlxBlogRepository {
    type Item = Blog;

    fn fields(&self) -> &'static FieldMap {
        &BLOG_FIELDS
    }

    async fn fetch(&self, query: &ShapedQuery) -> Result<Vec<Blog>, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new(BLOG_SELECT);
        let mut predicate = PredicateWriter::new();
        predicate.clauses(&mut qb, &query.scope);
        predicate.clauses(&mut qb, &query.filters);
        if let Some(term) = query.search.as_deref() {
            predicate.text_match(&mut qb, "b.search_tsv", term);
        }
        push_order(&mut qb, &query.order, " ORDER BY b.created_at DESC");
        push_window(&mut qb, query.window);

        let rows: Vec<BlogRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &ResidualFilter) -> Result<i64, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new(BLOG_COUNT);
        let mut predicate = PredicateWriter::new();
        predicate.clauses(&mut qb, &filter.scope);
        predicate.clauses(&mut qb, &filter.filters);
        if let Some(term) = filter.search.as_deref() {
            predicate.text_match(&mut qb, "b.search_tsv", term);
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
        let mut qb = QueryBuilder::<Postgres>::new(BLOG_COUNT);
        let mut predicate = PredicateWriter::new();
        predicate.clauses(&mut qb, scope);
        predicate.text_match(&mut qb, "b.search_tsv", term);
        qb.build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))
    }
}

#[derive(sqlx::FromRow)]
struct BlogRow {
    id: Uuid,
    title: String,
    description: String,
    content: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_id: Option<Uuid>,
    author_username: Option<String>,
    author_email: Option<String>,
    author_avatar_url: Option<String>,
    cat_id: Option<Uuid>,
    cat_name: Option<String>,
    likes: Vec<Uuid>,
}

impl From<BlogRow> for Blog {
    fn from(r: BlogRow) -> Self {
        let user = match (r.author_id, r.author_username, r.author_email) {
            (Some(id), Some(username), Some(email)) => Some(Author {
                id,
                username,
                email,
                avatar_url: r.author_avatar_url,
            }),
            _ => None,
        };
        let category = match (r.cat_id, r.cat_name) {
            (Some(id), Some(name)) => Some(CategoryRef { id, name }),
            _ => None,
        };
        Blog {
            id: r.id,
            title: r.title,
            description: r.description,
            content: r.content,
            image_url: r.image_url,
            user,
            category,
            likes: r.likes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
