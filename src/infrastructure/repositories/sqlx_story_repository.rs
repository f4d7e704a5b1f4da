use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::blog::entity::Author;
use crate::domain::shared::{
    errors::DomainError,
    listing::ListingBackend,
    query::{FieldKind, FieldMap, FieldSpec, FilterClause, FilterValue, ResidualFilter, ShapedQuery},
};
use crate::domain::story::{
    entity::{NewStory, Story},
    repository::StoryRepository,
};

use super::sql::{PredicateWriter, push_order, push_window};

pub static STORY_FIELDS: FieldMap = FieldMap(&[
    FieldSpec {
        name: "user",
        column: "s.user_id",
        kind: FieldKind::Uuid,
    },
    FieldSpec {
        name: "createdAt",
        column: "s.created_at",
        kind: FieldKind::Timestamp,
    },
]);

const STORY_SELECT: &str = "SELECT s.id, s.content, s.image_url, s.created_at, s.updated_at, \
            u.id AS author_id, u.username AS author_username, u.email AS author_email, \
            u.avatar_url AS author_avatar_url \
     FROM stories s \
     LEFT JOIN users u ON u.id = s.user_id";

pub struct SqlxStoryRepository {
    pub pool: PgPool,
}

impl SqlxStoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn scope_by_user(user_id: Uuid) -> Vec<FilterClause> {
        vec![FilterClause::eq("s.user_id", FilterValue::Uuid(user_id))]
    }

    async fn fetch_populated(&self, id: Uuid) -> Result<Option<Story>, DomainError> {
        let sql = format!("{STORY_SELECT} WHERE s.id = $1");
        let row = sqlx::query_as::<_, StoryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl StoryRepository for SqlxStoryRepository {
    async fn create(&self, story: &NewStory) -> Result<Story, DomainError> {
        let id = Uuid::now_v7();
        sqlx::query("INSERT INTO stories (id, user_id, content, image_url) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(story.user_id)
            .bind(&story.content)
            .bind(story.image_url.as_deref())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;

        self.fetch_populated(id)
            .await?
            .ok_or_else(|| DomainError::InfrastructureError("created story vanished".into()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Story>, DomainError> {
        self.fetch_populated(id).await
    }

    async fn update(
        &self,
        id: Uuid,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE stories SET content = $2, image_url = COALESCE($3, image_url), \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(content)
        .bind(image_url)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("story".into()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("story".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ListingBackend for SqlxStoryRepository {
    type Item = Story;

    fn fields(&self) -> &'static FieldMap {
        &STORY_FIELDS
    }

    async fn fetch(&self, query: &ShapedQuery) -> Result<Vec<Story>, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new(STORY_SELECT);
        let mut predicate = PredicateWriter::new();
        predicate.clauses(&mut qb, &query.scope);
        predicate.clauses(&mut qb, &query.filters);
        if let Some(term) = query.search.as_deref() {
            predicate.text_match(&mut qb, "s.search_tsv", term);
        }
        push_order(&mut qb, &query.order, " ORDER BY s.created_at DESC");
        push_window(&mut qb, query.window);

        let rows: Vec<StoryRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &ResidualFilter) -> Result<i64, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)::bigint FROM stories s");
        let mut predicate = PredicateWriter::new();
        predicate.clauses(&mut qb, &filter.scope);
        predicate.clauses(&mut qb, &filter.filters);
        if let Some(term) = filter.search.as_deref() {
            predicate.text_match(&mut qb, "s.search_tsv", term);
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
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)::bigint FROM stories s");
        let mut predicate = PredicateWriter::new();
        predicate.clauses(&mut qb, scope);
        predicate.text_match(&mut qb, "s.search_tsv", term);
        qb.build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))
    }
}

#[derive(sqlx::FromRow)]
struct StoryRow {
    id: Uuid,
    content: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_id: Option<Uuid>,
    author_username: Option<String>,
    author_email: Option<String>,
    author_avatar_url: Option<String>,
}

impl From<StoryRow> for Story {
    fn from(r: StoryRow) -> Self {
        let user = match (r.author_id, r.author_username, r.author_email) {
            (Some(id), Some(username), Some(email)) => Some(Author {
                id,
                username,
                email,
                avatar_url: r.author_avatar_url,
            }),
            _ => None,
        };
        Story {
            id: r.id,
            content: r.content,
            image_url: r.image_url,
            user,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
