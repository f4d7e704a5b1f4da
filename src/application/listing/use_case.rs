//! The listing orchestrator.
//!
//! Shapes the request into a query, runs the page fetch and the residual
//! count concurrently, and reconciles the two into a `Listing`. The two
//! suboperations settle independently: a failed fetch degrades to an empty
//! page and a failed count to zero, never aborting the other or the request.
//! Only builder-stage faults (a malformed filter value) escape this boundary.
//!
//! When a search term is active, the plain residual count is discarded and
//! the text-match count over the original collection scope is authoritative;
//! text-relevance cardinality cannot be derived from the residual count.

use tracing::warn;

use super::dto::Listing;
use crate::domain::shared::{
    errors::DomainError,
    listing::ListingBackend,
    pagination::page_count,
    query::{FilterClause, ListingParams, QueryFeatures},
};

pub async fn run<B: ListingBackend>(
    backend: &B,
    scope: Vec<FilterClause>,
    params: &ListingParams,
) -> Result<Listing<B::Item>, DomainError> {
    let (query, residual) = QueryFeatures::new(scope, params, backend.fields())
        .paginate()
        .search()
        .sort()
        .filter()?
        .into_parts();

    let (fetched, counted) = tokio::join!(backend.fetch(&query), backend.count(&residual));

    let data = fetched.unwrap_or_else(|e| {
        warn!(error = %e, "listing fetch failed, serving empty page");
        Vec::new()
    });

    let matches = match query.search.as_deref() {
        Some(term) => backend
            .count_text_matches(&query.scope, term)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "text match count failed, reporting zero pages");
                0
            }),
        None => counted.unwrap_or_else(|e| {
            warn!(error = %e, "listing count failed, reporting zero pages");
            0
        }),
    };

    Ok(Listing {
        data,
        total_count: page_count(matches, query.window.limit),
    })
}
