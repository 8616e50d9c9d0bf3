// Postgres storage layer with sqlx
//
// This crate provides the database implementation of the core store trait:
// - DbActivityStore: implements ActivityStore for activity persistence

pub mod activity_store;
pub mod models;
pub mod repositories;

pub use activity_store::{create_db_activity_store, DbActivityStore};
pub use models::*;
pub use repositories::*;
