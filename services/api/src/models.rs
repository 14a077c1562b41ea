//! API models for request and response payloads and database rows

pub mod ingredient;
pub mod recipe;
pub mod tag;
pub mod user;
