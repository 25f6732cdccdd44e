use tracing::warn;

use photoshare_shared::{Photo, PhotoId, Session, SignedUrl};

use crate::data_client::DataClient;
use crate::routes::Route;
use crate::state::AppContext;
use crate::storage::StorageClient;
use crate::view::{Notice, NoticeKind, ViewStatus};

/// A single photo at `/photos/{id}`.
pub struct PhotoDetailController {
    data: DataClient,
    storage: StorageClient,
    session: Session,
    photo_id: PhotoId,
    photo: Option<Photo>,
    image_url: Option<SignedUrl>,
    status: ViewStatus,
    notice: Option<Notice>,
    navigate_to: Option<Route>,
}

impl PhotoDetailController {
    pub fn new(ctx: &AppContext, session: Session, photo_id: PhotoId) -> Self {
        Self {
            data: ctx.data.clone(),
            storage: ctx.storage.clone(),
            session,
            photo_id,
            photo: None,
            image_url: None,
            status: ViewStatus::Loading,
            notice: None,
            navigate_to: None,
        }
    }

    /// Fetch the record and resolve a fresh image URL.
    ///
    /// A missing photo or a failed load sends the user back to the gallery.
    pub async fn load(&mut self) {
        self.status = ViewStatus::Loading;
        self.image_url = None;

        match self.data.photos().get(&self.session, self.photo_id).await {
            Ok(Some(photo)) => {
                self.image_url = match self.storage.resolve_url(&self.session, &photo.s3_key).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!(photo_id = %photo.id, error = %e, "Failed to resolve image URL");
                        None
                    }
                };
                self.photo = Some(photo);
                self.status = ViewStatus::Ready;
            }
            Ok(None) => {
                self.photo = None;
                self.status = ViewStatus::Empty;
                self.notice = Some(Notice::inline("Photo not found"));
                self.navigate_to = Some(Route::Gallery);
            }
            Err(e) => {
                self.photo = None;
                self.status = ViewStatus::Error;
                self.notice = Some(Notice::from_error(
                    "Failed to load photo",
                    &e,
                    NoticeKind::Inline,
                ));
                self.navigate_to = Some(Route::Gallery);
            }
        }
    }

    pub fn photo(&self) -> Option<&Photo> {
        self.photo.as_ref()
    }

    pub fn image_url(&self) -> Option<&SignedUrl> {
        self.image_url.as_ref()
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn take_navigation(&mut self) -> Option<Route> {
        self.navigate_to.take()
    }

    /// Whether to offer the delete control.
    pub fn is_owner(&self) -> bool {
        self.photo
            .as_ref()
            .is_some_and(|p| p.user_id == self.session.user_id)
    }

    /// Delete object then record; navigates to the gallery on success.
    pub async fn delete(&mut self) -> bool {
        let Some(photo) = self.photo.clone() else {
            self.notice = Some(Notice::inline("Nothing to delete"));
            return false;
        };

        match super::delete_photo(&self.data, &self.storage, &self.session, &photo).await {
            Ok(()) => {
                self.photo = None;
                self.image_url = None;
                self.status = ViewStatus::Empty;
                self.navigate_to = Some(Route::Gallery);
                true
            }
            Err(notice) => {
                self.notice = Some(notice);
                false
            }
        }
    }
}
