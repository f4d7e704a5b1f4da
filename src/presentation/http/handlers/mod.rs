pub mod auth;
pub mod blogs;
pub mod categories;
pub mod health;
pub mod stories;
pub mod users;
