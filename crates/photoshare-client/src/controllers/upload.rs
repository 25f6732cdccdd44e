use std::path::Path;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};

use photoshare_shared::api::is_image_content_type;
use photoshare_shared::{NewPhoto, Photo, PhotoId, Session};

use crate::data_client::DataClient;
use crate::routes::Route;
use crate::state::AppContext;
use crate::storage::{photo_path, StorageClient};
use crate::view::{Notice, NoticeKind};

/// What the upload form collected.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Uploading,
    Uploaded(PhotoId),
    Failed,
}

pub struct UploadController {
    data: DataClient,
    storage: StorageClient,
    session: Session,
    status: UploadStatus,
    notice: Option<Notice>,
    navigate_to: Option<Route>,
}

impl UploadController {
    pub fn new(ctx: &AppContext, session: Session) -> Self {
        Self {
            data: ctx.data.clone(),
            storage: ctx.storage.clone(),
            session,
            status: UploadStatus::Idle,
            notice: None,
            navigate_to: None,
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn take_navigation(&mut self) -> Option<Route> {
        self.navigate_to.take()
    }

    /// Upload the object, then create the record pointing at it.
    ///
    /// A record create that fails after the object upload leaves the object
    /// orphaned; there is no rollback.
    pub async fn submit(&mut self, form: UploadForm) -> Option<Photo> {
        if !is_image_content_type(&form.content_type) {
            self.reject("Please choose an image file");
            return None;
        }
        if form.title.trim().is_empty() {
            self.reject("Please enter a title");
            return None;
        }

        self.status = UploadStatus::Uploading;
        let path = photo_path(&form.file_name, Utc::now());

        if let Err(e) = self
            .storage
            .put(&self.session, &path, form.bytes, &form.content_type)
            .await
        {
            self.status = UploadStatus::Failed;
            self.notice = Some(Notice::from_error("Upload failed", &e, NoticeKind::Alert));
            return None;
        }

        let draft = NewPhoto {
            title: form.title,
            description: form.description,
            s3_key: path.clone(),
        };
        match self.data.photos().create(&self.session, draft).await {
            Ok(photo) => {
                info!(photo_id = %photo.id, path = %path, "Photo uploaded");
                self.status = UploadStatus::Uploaded(photo.id);
                self.navigate_to = Some(Route::Gallery);
                Some(photo)
            }
            Err(e) => {
                warn!(path = %path, "Object uploaded without a photo record; it is now orphaned");
                self.status = UploadStatus::Failed;
                self.notice = Some(Notice::from_error("Upload failed", &e, NoticeKind::Alert));
                None
            }
        }
    }

    fn reject(&mut self, message: &str) {
        self.status = UploadStatus::Idle;
        self.notice = Some(Notice::inline(message));
    }
}

/// Content type declared for a local file, from its extension.
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use photoshare_shared::PhotoFilter;

    fn form(title: &str, content_type: &str) -> UploadForm {
        UploadForm {
            title: title.into(),
            description: None,
            file_name: "pic.png".into(),
            content_type: content_type.into(),
            bytes: Bytes::from_static(b"pixels"),
        }
    }

    #[test]
    fn content_types_from_extension() {
        assert_eq!(content_type_for(Path::new("a/b/Cat.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("x.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("x.webp")), "image/webp");
        assert_eq!(content_type_for(Path::new("scan.tif")), "image/tiff");
        assert_eq!(content_type_for(Path::new("scan.TIFF")), "image/tiff");
        assert_eq!(content_type_for(Path::new("hdr.avif")), "image/avif");
        assert_eq!(content_type_for(Path::new("favicon.ico")), "image/x-icon");
        assert_eq!(content_type_for(Path::new("notes.txt")), "text/plain");
        assert_eq!(
            content_type_for(Path::new("noext")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn rejects_non_images_without_uploading() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let mut upload = UploadController::new(&h.ctx, alice.clone());

        assert!(upload.submit(form("Doc", "text/plain")).await.is_none());
        let notice = upload.take_notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Inline);

        assert!(upload.submit(form("   ", "image/png")).await.is_none());
        assert_eq!(upload.status(), UploadStatus::Idle);

        let photos = h.ctx.data.photos().list(&alice, PhotoFilter).await.unwrap();
        assert!(photos.is_empty());
    }

    #[tokio::test]
    async fn upload_creates_record_and_object() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let mut upload = UploadController::new(&h.ctx, alice.clone());

        let photo = upload.submit(form("Pic", "image/png")).await.unwrap();
        assert_eq!(upload.status(), UploadStatus::Uploaded(photo.id));
        assert_eq!(upload.take_navigation(), Some(Route::Gallery));
        assert!(photo.s3_key.starts_with("photos/"));
        assert!(photo.s3_key.ends_with("-pic.png"));
        assert_eq!(photo.user_id, alice.user_id);

        let url = h.ctx.storage.resolve_url(&alice, &photo.s3_key).await.unwrap();
        assert_eq!(
            h.ctx.storage.download(&url).await.unwrap().bytes.as_ref(),
            b"pixels"
        );
    }

    #[tokio::test]
    async fn tiff_files_are_accepted() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let mut upload = UploadController::new(&h.ctx, alice.clone());

        let mut scan = form("Scan", &content_type_for(Path::new("scan.tif")));
        scan.file_name = "scan.tif".into();
        let photo = upload.submit(scan).await.unwrap();
        assert!(photo.s3_key.ends_with("-scan.tif"));

        let url = h.ctx.storage.resolve_url(&alice, &photo.s3_key).await.unwrap();
        let body = h.ctx.storage.download(&url).await.unwrap();
        assert_eq!(body.content_type, "image/tiff");
    }

    #[tokio::test]
    async fn failed_object_upload_creates_no_record() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let mut upload = UploadController::new(&h.ctx, alice.clone());

        let mut empty = form("Empty", "image/png");
        empty.bytes = Bytes::new();
        assert!(upload.submit(empty).await.is_none());
        assert_eq!(upload.status(), UploadStatus::Failed);
        assert_eq!(upload.take_notice().unwrap().kind, NoticeKind::Alert);

        let photos = h.ctx.data.photos().list(&alice, PhotoFilter).await.unwrap();
        assert!(photos.is_empty());
    }

    #[tokio::test]
    async fn record_failure_after_upload_leaves_object_orphaned() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let (ctx, photos) = h.with_failing_photo_writes();
        let mut upload = UploadController::new(&ctx, alice.clone());

        assert!(upload.submit(form("Pic", "image/png")).await.is_none());
        assert_eq!(upload.status(), UploadStatus::Failed);
        assert_eq!(upload.take_notice().unwrap().kind, NoticeKind::Alert);
        assert_eq!(upload.take_navigation(), None);

        let listed = h.ctx.data.photos().list(&alice, PhotoFilter).await.unwrap();
        assert!(listed.is_empty());
        let key = photos.attempted_key().unwrap();
        assert!(h.ctx.storage.resolve_url(&alice, &key).await.is_ok());
    }
}
