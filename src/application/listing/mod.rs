pub mod dto;
pub mod use_case;

pub use dto::Listing;
pub use use_case::run;
