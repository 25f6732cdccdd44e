use tracing::debug;

use photoshare_shared::records::sort_newest_first;
use photoshare_shared::{Photo, PhotoFilter, PhotoId, Session, SignedUrl};

use crate::data_client::DataClient;
use crate::state::AppContext;
use crate::storage::StorageClient;
use crate::view::{Notice, NoticeKind, ViewStatus};

/// The photo grid at `/gallery`.
pub struct GalleryController {
    data: DataClient,
    storage: StorageClient,
    session: Session,
    photos: Vec<Photo>,
    status: ViewStatus,
    notice: Option<Notice>,
}

impl GalleryController {
    pub fn new(ctx: &AppContext, session: Session) -> Self {
        Self {
            data: ctx.data.clone(),
            storage: ctx.storage.clone(),
            session,
            photos: Vec::new(),
            status: ViewStatus::Loading,
            notice: None,
        }
    }

    /// Full reload from the backend, newest upload first.
    pub async fn load(&mut self) {
        self.status = ViewStatus::Loading;
        match self.data.photos().list(&self.session, PhotoFilter).await {
            Ok(mut photos) => {
                sort_newest_first(&mut photos);
                self.status = ViewStatus::for_count(photos.len());
                self.photos = photos;
            }
            Err(e) => {
                self.status = ViewStatus::Error;
                self.notice = Some(Notice::from_error(
                    "Failed to load photos",
                    &e,
                    NoticeKind::Inline,
                ));
            }
        }
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn is_owner(&self, photo: &Photo) -> bool {
        photo.user_id == self.session.user_id
    }

    /// Resolve a fresh URL for a thumbnail; `None` renders as "no image".
    pub async fn image_url(&self, photo: &Photo) -> Option<SignedUrl> {
        match self.storage.resolve_url(&self.session, &photo.s3_key).await {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(photo_id = %photo.id, error = %e, "No image for photo");
                None
            }
        }
    }

    /// Delete an owned photo; on success it leaves the local list without a
    /// reload, on failure the list is untouched and an alert is raised.
    pub async fn delete(&mut self, id: PhotoId) -> bool {
        let Some(photo) = self.photos.iter().find(|p| p.id == id).cloned() else {
            self.notice = Some(Notice::inline("That photo is not in the gallery"));
            return false;
        };

        match super::delete_photo(&self.data, &self.storage, &self.session, &photo).await {
            Ok(()) => {
                self.photos.retain(|p| p.id != id);
                self.status = ViewStatus::for_count(self.photos.len());
                true
            }
            Err(notice) => {
                self.notice = Some(notice);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::upload::{UploadController, UploadForm};
    use crate::testing::Harness;
    use bytes::Bytes;

    async fn upload(h: &Harness, session: &Session, title: &str, file: &str) -> Photo {
        let mut upload = UploadController::new(&h.ctx, session.clone());
        upload
            .submit(UploadForm {
                title: title.into(),
                description: None,
                file_name: file.into(),
                content_type: "image/png".into(),
                bytes: Bytes::from(format!("bytes of {file}")),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn empty_gallery() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;

        let mut gallery = GalleryController::new(&h.ctx, alice);
        assert_eq!(gallery.status(), ViewStatus::Loading);
        gallery.load().await;
        assert_eq!(gallery.status(), ViewStatus::Empty);
    }

    #[tokio::test]
    async fn upload_then_reload_shows_new_photo_with_its_bytes() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let photo = upload(&h, &alice, "Sunset", "sunset.png").await;

        let mut gallery = GalleryController::new(&h.ctx, alice);
        gallery.load().await;
        assert_eq!(gallery.status(), ViewStatus::Ready);
        assert_eq!(gallery.photos(), &[photo.clone()]);

        let url = gallery.image_url(&photo).await.unwrap();
        let body = h.ctx.storage.download(&url).await.unwrap();
        assert_eq!(body.bytes.as_ref(), b"bytes of sunset.png");
    }

    #[tokio::test]
    async fn newest_first() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let first = upload(&h, &alice, "First", "a.png").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = upload(&h, &alice, "Second", "b.png").await;

        let mut gallery = GalleryController::new(&h.ctx, alice);
        gallery.load().await;
        let ids: Vec<_> = gallery.photos().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn stale_list_until_reload() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let bob = h.signed_in("bob@test.com").await;
        let photo = upload(&h, &alice, "Shared", "p.png").await;

        let mut a = GalleryController::new(&h.ctx, alice);
        let mut b = GalleryController::new(&h.ctx, bob);
        a.load().await;
        b.load().await;

        assert!(a.delete(photo.id).await);
        assert!(a.photos().is_empty());
        assert_eq!(a.status(), ViewStatus::Empty);

        // B still sees the deleted photo, but its image no longer resolves
        assert_eq!(b.photos().len(), 1);
        assert!(b.image_url(&photo).await.is_none());

        b.load().await;
        assert!(b.photos().is_empty());
    }

    #[tokio::test]
    async fn non_owner_delete_leaves_everything_in_place() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let bob = h.signed_in("bob@test.com").await;
        let photo = upload(&h, &alice, "Mine", "m.png").await;

        let mut b = GalleryController::new(&h.ctx, bob.clone());
        b.load().await;
        assert!(!b.is_owner(&photo));
        assert!(!b.delete(photo.id).await);

        let notice = b.take_notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Alert);
        assert_eq!(b.photos().len(), 1);

        // record and object both still resolve
        assert!(h.ctx.data.photos().get(&bob, photo.id).await.unwrap().is_some());
        assert!(b.image_url(&photo).await.is_some());
    }

    #[tokio::test]
    async fn record_delete_failure_after_object_delete_keeps_list() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let photo = upload(&h, &alice, "Half gone", "h.png").await;

        let (ctx, _) = h.with_failing_photo_writes();
        let mut gallery = GalleryController::new(&ctx, alice.clone());
        gallery.load().await;
        assert!(!gallery.delete(photo.id).await);

        assert_eq!(gallery.take_notice().unwrap().kind, NoticeKind::Alert);
        assert_eq!(gallery.photos(), &[photo.clone()]);
        assert_eq!(gallery.status(), ViewStatus::Ready);

        // not atomic: the object is gone while the record remains
        assert!(h.ctx.data.photos().get(&alice, photo.id).await.unwrap().is_some());
        assert!(gallery.image_url(&photo).await.is_none());
    }
}
