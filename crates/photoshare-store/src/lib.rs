//! # photoshare-store
//!
//! Local SQLite storage backing the PhotoShare local backend.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for photos,
//! comments, accounts and sessions.  It performs no authorization: callers
//! evaluate the schema's rule matrix before touching it.

pub mod accounts;
pub mod comments;
pub mod database;
pub mod migrations;
pub mod models;
pub mod photos;
pub mod sessions;

mod error;

pub use database::{default_data_dir, Database};
pub use error::{Result, StoreError};
pub use models::*;
