pub mod errors;
pub mod listing;
pub mod pagination;
pub mod query;
