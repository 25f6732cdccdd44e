//! # photoshare-shared
//!
//! Types shared by every PhotoShare crate: record kinds, ids, the declarative
//! schema with its authorization matrix, the error taxonomy, and the traits
//! describing the backend platform (data API, object store, identity).

pub mod api;
pub mod constants;
pub mod error;
pub mod records;
pub mod schema;
pub mod types;

pub use api::{Backend, IdentityService, ObjectBody, ObjectStore, RecordApi, SignUpOutcome, SignedUrl};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use records::{Comment, CommentFilter, NewComment, NewPhoto, Photo, PhotoFilter, Record};
pub use schema::RecordKind;
pub use types::{CommentId, PhotoId, Session, SessionToken, UserId};
