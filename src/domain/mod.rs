pub mod blog;
pub mod category;
pub mod shared;
pub mod story;
pub mod user;
