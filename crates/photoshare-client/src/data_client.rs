//! Typed facade over the data API.
//!
//! [`Model`] checks drafts against the schema before anything is sent and
//! logs every remote call.  Nothing is cached: each call goes to the backend.

use std::sync::Arc;

use tracing::debug;

use photoshare_shared::{ApiResult, Backend, Comment, Photo, Record, RecordApi, Session};

/// Remote operations for one record kind.
pub struct Model<R: Record> {
    api: Arc<dyn RecordApi<R>>,
}

impl<R: Record> Clone for Model<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
        }
    }
}

impl<R: Record> Model<R> {
    pub fn new(api: Arc<dyn RecordApi<R>>) -> Self {
        Self { api }
    }

    pub async fn list(&self, session: &Session, filter: R::Filter) -> ApiResult<Vec<R>> {
        let records = self.api.list(session, filter).await?;
        debug!(kind = %R::KIND, count = records.len(), "list");
        Ok(records)
    }

    pub async fn get(&self, session: &Session, id: R::Id) -> ApiResult<Option<R>> {
        let record = self.api.get(session, id).await?;
        debug!(kind = %R::KIND, id = %id, found = record.is_some(), "get");
        Ok(record)
    }

    /// Validate locally, then create remotely.
    pub async fn create(&self, session: &Session, draft: R::Draft) -> ApiResult<R> {
        R::validate_draft(&draft)?;
        let record = self.api.create(session, draft).await?;
        debug!(kind = %R::KIND, id = %record.id(), "create");
        Ok(record)
    }

    pub async fn delete(&self, session: &Session, id: R::Id) -> ApiResult<()> {
        self.api.delete(session, id).await?;
        debug!(kind = %R::KIND, id = %id, "delete");
        Ok(())
    }
}

#[derive(Clone)]
pub struct DataClient {
    photos: Model<Photo>,
    comments: Model<Comment>,
}

impl DataClient {
    pub fn new(backend: &Backend) -> Self {
        Self {
            photos: Model::new(backend.photos.clone()),
            comments: Model::new(backend.comments.clone()),
        }
    }

    pub fn photos(&self) -> &Model<Photo> {
        &self.photos
    }

    pub fn comments(&self) -> &Model<Comment> {
        &self.comments
    }
}
