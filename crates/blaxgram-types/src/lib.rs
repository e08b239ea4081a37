//! Shared types for the Blaxgram backend: JSON request/response shapes,
//! JWT claims and the string enums stored in SQLite CHECK columns.

pub mod api;
pub mod models;
