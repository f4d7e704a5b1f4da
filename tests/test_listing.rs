//! Orchestrator behavior over a stubbed backend: concurrency reconciliation,
//! partial-failure degradation, and the search count override.

use std::sync::Mutex;

use async_trait::async_trait;

use api::application::listing;
use api::domain::shared::{
    errors::DomainError,
    listing::ListingBackend,
    query::{FieldKind, FieldMap, FieldSpec, FilterClause, ListingParams, ResidualFilter, ShapedQuery},
};

static FIELDS: FieldMap = FieldMap(&[FieldSpec {
    name: "title",
    column: "b.title",
    kind: FieldKind::Text,
}]);

/// Backend stub: each suboperation either yields its configured value or
/// fails, and the text-count call records its arguments for assertions.
struct StubBackend {
    fetch: Option<Vec<String>>,
    count: Option<i64>,
    text_count: Option<i64>,
    text_count_calls: Mutex<Vec<(usize, String)>>,
}

impl StubBackend {
    fn new(fetch: Option<Vec<String>>, count: Option<i64>, text_count: Option<i64>) -> Self {
        Self {
            fetch,
            count,
            text_count,
            text_count_calls: Mutex::new(Vec::new()),
        }
    }

    fn text_count_calls(&self) -> Vec<(usize, String)> {
        self.text_count_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListingBackend for StubBackend {
    type Item = String;

    fn fields(&self) -> &'static FieldMap {
        &FIELDS
    }

    async fn fetch(&self, _query: &ShapedQuery) -> Result<Vec<String>, DomainError> {
        self.fetch
            .clone()
            .ok_or_else(|| DomainError::InfrastructureError("fetch down".into()))
    }

    async fn count(&self, _filter: &ResidualFilter) -> Result<i64, DomainError> {
        self.count
            .ok_or_else(|| DomainError::InfrastructureError("count down".into()))
    }

    async fn count_text_matches(
        &self,
        scope: &[FilterClause],
        term: &str,
    ) -> Result<i64, DomainError> {
        self.text_count_calls
            .lock()
            .unwrap()
            .push((scope.len(), term.to_string()));
        self.text_count
            .ok_or_else(|| DomainError::InfrastructureError("text count down".into()))
    }
}

fn page(n: i64) -> ListingParams {
    ListingParams {
        page: Some(n),
        limit: Some(10),
        ..Default::default()
    }
}

#[tokio::test]
async fn total_count_is_pages_not_documents() {
    let backend = StubBackend::new(Some(vec!["a".into(); 10]), Some(25), None);
    let listing = listing::run(&backend, Vec::new(), &page(2)).await.unwrap();
    assert_eq!(listing.data.len(), 10);
    assert_eq!(listing.total_count, 3);
}

#[tokio::test]
async fn failed_fetch_serves_empty_page_with_real_count() {
    let backend = StubBackend::new(None, Some(5), None);
    let listing = listing::run(&backend, Vec::new(), &page(1)).await.unwrap();
    assert!(listing.data.is_empty());
    assert_eq!(listing.total_count, 1);
}

#[tokio::test]
async fn failed_count_serves_data_with_zero_pages() {
    let backend = StubBackend::new(Some(vec!["a".into(), "b".into()]), None, None);
    let listing = listing::run(&backend, Vec::new(), &page(1)).await.unwrap();
    assert_eq!(listing.data.len(), 2);
    assert_eq!(listing.total_count, 0);
}

#[tokio::test]
async fn both_failures_degrade_to_empty_result() {
    let backend = StubBackend::new(None, None, None);
    let listing = listing::run(&backend, Vec::new(), &page(1)).await.unwrap();
    assert!(listing.data.is_empty());
    assert_eq!(listing.total_count, 0);
}

#[tokio::test]
async fn search_count_overrides_residual_count() {
    // Residual count says 100; the text-match count is authoritative.
    let backend = StubBackend::new(Some(Vec::new()), Some(100), Some(12));
    let params = ListingParams {
        search: Some("mountains".into()),
        ..Default::default()
    };
    let listing = listing::run(&backend, Vec::new(), &params).await.unwrap();
    assert_eq!(listing.total_count, 2);

    let calls = backend.text_count_calls();
    assert_eq!(calls, vec![(0, "mountains".to_string())]);
}

#[tokio::test]
async fn search_count_runs_over_original_scope() {
    let scope = vec![FilterClause::eq(
        "b.user_id",
        api::domain::shared::query::FilterValue::Uuid(uuid::Uuid::now_v7()),
    )];
    let backend = StubBackend::new(Some(Vec::new()), Some(0), Some(3));
    let params = ListingParams {
        search: Some("term".into()),
        ..Default::default()
    };
    let listing = listing::run(&backend, scope, &params).await.unwrap();
    assert_eq!(listing.total_count, 1);
    // Scope carried through untouched to the text count.
    assert_eq!(backend.text_count_calls()[0].0, 1);
}

#[tokio::test]
async fn failed_search_count_degrades_to_zero_pages() {
    let backend = StubBackend::new(Some(vec!["a".into()]), Some(50), None);
    let params = ListingParams {
        search: Some("term".into()),
        ..Default::default()
    };
    let listing = listing::run(&backend, Vec::new(), &params).await.unwrap();
    assert_eq!(listing.data.len(), 1);
    assert_eq!(listing.total_count, 0);
}

#[tokio::test]
async fn blank_search_is_ignored_entirely() {
    let backend = StubBackend::new(Some(Vec::new()), Some(10), Some(99));
    let params = ListingParams {
        search: Some("   ".into()),
        ..Default::default()
    };
    let listing = listing::run(&backend, Vec::new(), &params).await.unwrap();
    assert_eq!(listing.total_count, 1);
    assert!(backend.text_count_calls().is_empty());
}

#[tokio::test]
async fn malformed_filter_fails_before_any_suboperation() {
    let backend = StubBackend::new(Some(Vec::new()), Some(0), None);
    let params: ListingParams =
        serde_json::from_value(serde_json::json!({"title[within]": "x"})).unwrap();
    let err = listing::run(&backend, Vec::new(), &params).await;
    assert!(matches!(err, Err(DomainError::ValidationError(_))));
}
