//! Data API over the SQLite store, enforcing each kind's rule matrix.
//!
//! Every call resolves the caller from the session token first, derives the
//! principal classes against the record's owner and only then touches the
//! table.  Owner fields, ids and timestamps are assigned here.  A photo may
//! only be created over an object its creator has already stored.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use photoshare_shared::constants::ANONYMOUS_USERNAME;
use photoshare_shared::schema::{principals_for, Operation, COMMENT_SCHEMA, PHOTO_SCHEMA};
use photoshare_shared::{
    ApiError, ApiResult, Comment, CommentFilter, CommentId, NewComment, NewPhoto, Photo,
    PhotoFilter, PhotoId, RecordApi, RecordKind, Session,
};
use photoshare_store::{Database, StoreError};

use crate::error::{lock_db, store_error};
use crate::identity::{resolve_caller, Caller};
use crate::object_store::FsObjectStore;

pub struct LocalRecords {
    db: Arc<Mutex<Database>>,
    objects: Arc<FsObjectStore>,
}

impl LocalRecords {
    pub fn new(db: Arc<Mutex<Database>>, objects: Arc<FsObjectStore>) -> Self {
        Self { db, objects }
    }
}

fn caller_id(caller: &Option<Caller>) -> Option<&photoshare_shared::UserId> {
    caller.as_ref().map(|c| &c.user_id)
}

fn display_name(caller: &Caller) -> String {
    if caller.login_id.trim().is_empty() {
        ANONYMOUS_USERNAME.to_string()
    } else {
        caller.login_id.clone()
    }
}

// ---------------------------------------------------------------------------
// Photo
// ---------------------------------------------------------------------------

#[async_trait]
impl RecordApi<Photo> for LocalRecords {
    async fn list(&self, session: &Session, _filter: PhotoFilter) -> ApiResult<Vec<Photo>> {
        let db = lock_db(&self.db)?;
        let caller = resolve_caller(&db, session)?;
        // the read grant does not depend on ownership
        PHOTO_SCHEMA.authorize(Operation::Read, &principals_for(caller_id(&caller), None))?;

        let photos = db.list_photos().map_err(store_error)?;
        debug!(count = photos.len(), "Listed photos");
        Ok(photos)
    }

    async fn get(&self, session: &Session, id: PhotoId) -> ApiResult<Option<Photo>> {
        let db = lock_db(&self.db)?;
        let caller = resolve_caller(&db, session)?;

        let photo = match db.get_photo(id) {
            Ok(photo) => photo,
            Err(StoreError::NotFound) => {
                PHOTO_SCHEMA.authorize(Operation::Read, &principals_for(caller_id(&caller), None))?;
                return Ok(None);
            }
            Err(e) => return Err(store_error(e)),
        };
        PHOTO_SCHEMA.authorize(
            Operation::Read,
            &principals_for(caller_id(&caller), Some(&photo.user_id)),
        )?;
        Ok(Some(photo))
    }

    async fn create(&self, session: &Session, draft: NewPhoto) -> ApiResult<Photo> {
        let caller = {
            let db = lock_db(&self.db)?;
            resolve_caller(&db, session)?
        };
        let caller_user = caller_id(&caller);
        PHOTO_SCHEMA.authorize(Operation::Create, &principals_for(caller_user, caller_user))?;
        let Some(caller) = caller else {
            return Err(ApiError::authorization("create on Photo requires a signed-in user"));
        };

        PHOTO_SCHEMA.require_text("title", &draft.title)?;
        PHOTO_SCHEMA.require_text("s3Key", &draft.s3_key)?;

        let s3_key = draft.s3_key.trim();
        match self.objects.owner_of(s3_key).await? {
            Some(owner) if owner == caller.user_id => {}
            Some(_) => {
                return Err(ApiError::authorization(format!(
                    "{s3_key} belongs to another user"
                )))
            }
            None => {
                return Err(ApiError::validation(format!(
                    "s3Key {s3_key} does not name a stored object"
                )))
            }
        }

        let photo = Photo {
            id: PhotoId::new(),
            user_id: caller.user_id,
            title: draft.title.trim().to_string(),
            description: draft.normalized_description(),
            s3_key: s3_key.to_string(),
            uploaded_at: Utc::now(),
        };
        let db = lock_db(&self.db)?;
        db.insert_photo(&photo).map_err(|e| match e {
            StoreError::Constraint(_) => {
                ApiError::validation(format!("s3Key {} is already in use", photo.s3_key))
            }
            other => store_error(other),
        })?;

        info!(photo_id = %photo.id, owner = %photo.user_id, "Photo created");
        Ok(photo)
    }

    async fn delete(&self, session: &Session, id: PhotoId) -> ApiResult<()> {
        let db = lock_db(&self.db)?;
        let caller = resolve_caller(&db, session)?;

        let photo = match db.get_photo(id) {
            Ok(photo) => photo,
            Err(StoreError::NotFound) => {
                // anonymous callers learn nothing about which ids exist
                PHOTO_SCHEMA.authorize(Operation::Read, &principals_for(caller_id(&caller), None))?;
                return Err(ApiError::not_found(RecordKind::Photo.name(), id));
            }
            Err(e) => return Err(store_error(e)),
        };
        PHOTO_SCHEMA.authorize(
            Operation::Delete,
            &principals_for(caller_id(&caller), Some(&photo.user_id)),
        )?;

        if !db.delete_photo(id).map_err(store_error)? {
            return Err(ApiError::not_found(RecordKind::Photo.name(), id));
        }
        info!(photo_id = %id, "Photo deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[async_trait]
impl RecordApi<Comment> for LocalRecords {
    async fn list(&self, session: &Session, filter: CommentFilter) -> ApiResult<Vec<Comment>> {
        let db = lock_db(&self.db)?;
        let caller = resolve_caller(&db, session)?;
        COMMENT_SCHEMA.authorize(Operation::Read, &principals_for(caller_id(&caller), None))?;

        let comments = db.list_comments(filter.photo_id).map_err(store_error)?;
        debug!(count = comments.len(), photo_id = ?filter.photo_id, "Listed comments");
        Ok(comments)
    }

    async fn get(&self, session: &Session, id: CommentId) -> ApiResult<Option<Comment>> {
        let db = lock_db(&self.db)?;
        let caller = resolve_caller(&db, session)?;

        let comment = match db.get_comment(id) {
            Ok(comment) => comment,
            Err(StoreError::NotFound) => {
                COMMENT_SCHEMA
                    .authorize(Operation::Read, &principals_for(caller_id(&caller), None))?;
                return Ok(None);
            }
            Err(e) => return Err(store_error(e)),
        };
        COMMENT_SCHEMA.authorize(
            Operation::Read,
            &principals_for(caller_id(&caller), Some(&comment.user_id)),
        )?;
        Ok(Some(comment))
    }

    async fn create(&self, session: &Session, draft: NewComment) -> ApiResult<Comment> {
        let db = lock_db(&self.db)?;
        let caller = resolve_caller(&db, session)?;
        let caller_user = caller_id(&caller);
        COMMENT_SCHEMA.authorize(Operation::Create, &principals_for(caller_user, caller_user))?;
        let Some(caller) = caller else {
            return Err(ApiError::authorization("create on Comment requires a signed-in user"));
        };

        COMMENT_SCHEMA.require_text("content", &draft.content)?;
        if !db.photo_exists(draft.photo_id).map_err(store_error)? {
            return Err(ApiError::not_found(RecordKind::Photo.name(), draft.photo_id));
        }

        let comment = Comment {
            id: CommentId::new(),
            photo_id: draft.photo_id,
            user_id: caller.user_id,
            username: display_name(&caller),
            content: draft.content.trim().to_string(),
            created_at: Utc::now(),
        };
        db.insert_comment(&comment).map_err(|e| match e {
            // photo deleted between the check and the insert
            StoreError::Constraint(_) => {
                ApiError::not_found(RecordKind::Photo.name(), comment.photo_id)
            }
            other => store_error(other),
        })?;

        info!(comment_id = %comment.id, photo_id = %comment.photo_id, "Comment created");
        Ok(comment)
    }

    async fn delete(&self, session: &Session, id: CommentId) -> ApiResult<()> {
        let db = lock_db(&self.db)?;
        let caller = resolve_caller(&db, session)?;

        let comment = match db.get_comment(id) {
            Ok(comment) => comment,
            Err(StoreError::NotFound) => {
                COMMENT_SCHEMA
                    .authorize(Operation::Read, &principals_for(caller_id(&caller), None))?;
                return Err(ApiError::not_found(RecordKind::Comment.name(), id));
            }
            Err(e) => return Err(store_error(e)),
        };
        COMMENT_SCHEMA.authorize(
            Operation::Delete,
            &principals_for(caller_id(&caller), Some(&comment.user_id)),
        )?;

        if !db.delete_comment(id).map_err(store_error)? {
            return Err(ApiError::not_found(RecordKind::Comment.name(), id));
        }
        info!(comment_id = %id, "Comment deleted");
        Ok(())
    }
}
