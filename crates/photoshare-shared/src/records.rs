//! Record kinds exchanged with the data API.
//!
//! Records serialize with camelCase field names so they match the declared
//! schema (`userId`, `s3Key`, `uploadedAt`, ...).  Drafts carry only the
//! caller-supplied fields: ids, owners and timestamps are filled in by the
//! backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::schema::{RecordKind, COMMENT_SCHEMA, PHOTO_SCHEMA};
use crate::types::{CommentId, PhotoId, UserId};

/// Common surface of a record kind, used by the generic data client.
pub trait Record: Clone + Send + Sync + 'static {
    type Id: Copy + Eq + std::fmt::Display + Send + Sync + 'static;
    type Draft: Send + Sync + 'static;
    type Filter: Default + Send + Sync + 'static;

    const KIND: RecordKind;

    fn id(&self) -> Self::Id;
    fn owner(&self) -> &UserId;
    /// Timestamp lists are sorted by, newest first.
    fn created_at(&self) -> DateTime<Utc>;
    /// Client-side check of a draft before it is sent.
    fn validate_draft(draft: &Self::Draft) -> ApiResult<()>;
}

/// Sort newest first.
pub fn sort_newest_first<R: Record>(records: &mut [R]) {
    records.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
}

// ---------------------------------------------------------------------------
// Photo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: PhotoId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Object store path of the image bytes.
    pub s3_key: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewPhoto {
    pub title: String,
    pub description: Option<String>,
    pub s3_key: String,
}

impl NewPhoto {
    /// Blank descriptions are stored as absent.
    pub fn normalized_description(&self) -> Option<String> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
    }
}

/// Photos are listed unfiltered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhotoFilter;

impl Record for Photo {
    type Id = PhotoId;
    type Draft = NewPhoto;
    type Filter = PhotoFilter;

    const KIND: RecordKind = RecordKind::Photo;

    fn id(&self) -> PhotoId {
        self.id
    }

    fn owner(&self) -> &UserId {
        &self.user_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    fn validate_draft(draft: &NewPhoto) -> ApiResult<()> {
        PHOTO_SCHEMA.require_text("title", &draft.title)?;
        PHOTO_SCHEMA.require_text("s3Key", &draft.s3_key)
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub photo_id: PhotoId,
    pub user_id: UserId,
    /// Author display name as it was when the comment was written.
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub photo_id: PhotoId,
    pub content: String,
}

/// Equality filter on `photoId`; `None` lists every comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentFilter {
    pub photo_id: Option<PhotoId>,
}

impl CommentFilter {
    pub fn for_photo(photo_id: PhotoId) -> Self {
        Self {
            photo_id: Some(photo_id),
        }
    }
}

impl Record for Comment {
    type Id = CommentId;
    type Draft = NewComment;
    type Filter = CommentFilter;

    const KIND: RecordKind = RecordKind::Comment;

    fn id(&self) -> CommentId {
        self.id
    }

    fn owner(&self) -> &UserId {
        &self.user_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn validate_draft(draft: &NewComment) -> ApiResult<()> {
        COMMENT_SCHEMA.require_text("content", &draft.content)
    }
}
