use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::category::{entity::Category, repository::CategoryRepository};
use crate::domain::shared::{
    errors::DomainError,
    listing::ListingBackend,
    query::{FieldKind, FieldMap, FieldSpec, FilterClause, ResidualFilter, ShapedQuery},
};

use super::sql::{PredicateWriter, push_order, push_window};

pub static CATEGORY_FIELDS: FieldMap = FieldMap(&[
    FieldSpec {
        name: "name",
        column: "c.name",
        kind: FieldKind::Text,
    },
    FieldSpec {
        name: "createdAt",
        column: "c.created_at",
        kind: FieldKind::Timestamp,
    },
]);

const CATEGORY_SELECT: &str =
    "SELECT c.id, c.name, c.description, c.created_at FROM categories c";

pub struct SqlxCategoryRepository {
    pub pool: PgPool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, name: &str, description: Option<&str>) -> Result<Category, DomainError> {
        let id = Uuid::now_v7();
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, description) VALUES ($1, $2, $3) \
             RETURNING id, name, description, created_at",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                DomainError::ValidationError("category name already exists".into())
            }
            _ => DomainError::InfrastructureError(e.to_string()),
        })?;
        Ok(category)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, DomainError> {
        let sql = format!("{CATEGORY_SELECT} WHERE c.id = $1");
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))
    }

    async fn update(
        &self,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE categories SET name = $2, description = $3 WHERE id = $1")
            .bind(id)
            .bind(name)
            .bind(description)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("category".into()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("category".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ListingBackend for SqlxCategoryRepository {
    type Item = Category;

    fn fields(&self) -> &'static FieldMap {
        &CATEGORY_FIELDS
    }

    async fn fetch(&self, query: &ShapedQuery) -> Result<Vec<Category>, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new(CATEGORY_SELECT);
        let mut predicate = PredicateWriter::new();
        predicate.clauses(&mut qb, &query.scope);
        predicate.clauses(&mut qb, &query.filters);
        if let Some(term) = query.search.as_deref() {
            predicate.text_match(&mut qb, "c.search_tsv", term);
        }
        push_order(&mut qb, &query.order, " ORDER BY c.created_at DESC");
        push_window(&mut qb, query.window);

        qb.build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))
    }

    async fn count(&self, filter: &ResidualFilter) -> Result<i64, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)::bigint FROM categories c");
        let mut predicate = PredicateWriter::new();
        predicate.clauses(&mut qb, &filter.scope);
        predicate.clauses(&mut qb, &filter.filters);
        if let Some(term) = filter.search.as_deref() {
            predicate.text_match(&mut qb, "c.search_tsv", term);
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
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)::bigint FROM categories c");
        let mut predicate = PredicateWriter::new();
        predicate.clauses(&mut qb, scope);
        predicate.text_match(&mut qb, "c.search_tsv", term);
        qb.build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))
    }
}
