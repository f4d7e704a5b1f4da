use serde::Serialize;

/// Paginated listing response: one bounded page of documents plus the
/// total number of pages matching the request's predicate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing<T> {
    pub data: Vec<T>,
    pub total_count: i64,
}
