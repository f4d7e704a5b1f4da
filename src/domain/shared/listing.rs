//! Store primitives a listing runs against.
//!
//! A collection that wants shaped listings implements [`ListingBackend`]
//! over three independent operations: fetch a shaped page, count a residual
//! filter, and count text matches. The orchestrator in
//! `application::listing` composes them; see that module for the
//! partial-failure policy.

use async_trait::async_trait;

use super::errors::DomainError;
use super::query::{FieldMap, FilterClause, ResidualFilter, ShapedQuery};

#[async_trait]
pub trait ListingBackend: Send + Sync {
    type Item: Send;

    /// Fields this collection exposes to sort and filter parameters.
    fn fields(&self) -> &'static FieldMap;

    /// Execute the shaped query and return one page of documents.
    async fn fetch(&self, query: &ShapedQuery) -> Result<Vec<Self::Item>, DomainError>;

    /// Count documents matching the residual filter (no pagination).
    async fn count(&self, filter: &ResidualFilter) -> Result<i64, DomainError>;

    /// Count documents matching the full-text predicate over the original
    /// collection scope, ignoring pagination and pass-through filters.
    /// Authoritative when a search term is active.
    async fn count_text_matches(
        &self,
        scope: &[FilterClause],
        term: &str,
    ) -> Result<i64, DomainError>;
}
