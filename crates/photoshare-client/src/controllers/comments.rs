use photoshare_shared::records::sort_newest_first;
use photoshare_shared::{Comment, CommentFilter, CommentId, NewComment, PhotoId, Session};

use crate::data_client::DataClient;
use crate::state::AppContext;
use crate::view::{Notice, NoticeKind, ViewStatus};

/// The comment list and form under a photo.
pub struct CommentThreadController {
    data: DataClient,
    session: Session,
    photo_id: PhotoId,
    comments: Vec<Comment>,
    draft: String,
    status: ViewStatus,
    notice: Option<Notice>,
}

impl CommentThreadController {
    pub fn new(ctx: &AppContext, session: Session, photo_id: PhotoId) -> Self {
        Self {
            data: ctx.data.clone(),
            session,
            photo_id,
            comments: Vec::new(),
            draft: String::new(),
            status: ViewStatus::Loading,
            notice: None,
        }
    }

    /// Full reload of the photo's comments, newest first.
    pub async fn load(&mut self) {
        self.status = ViewStatus::Loading;
        let filter = CommentFilter::for_photo(self.photo_id);
        match self.data.comments().list(&self.session, filter).await {
            Ok(mut comments) => {
                sort_newest_first(&mut comments);
                self.status = ViewStatus::for_count(comments.len());
                self.comments = comments;
            }
            Err(e) => {
                self.status = ViewStatus::Error;
                self.notice = Some(Notice::from_error(
                    "Failed to load comments",
                    &e,
                    NoticeKind::Inline,
                ));
            }
        }
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Delete control is only offered on the caller's own comments.
    pub fn can_delete(&self, comment: &Comment) -> bool {
        comment.user_id == self.session.user_id
    }

    /// Post the current draft and reload the thread.
    pub async fn post(&mut self) -> bool {
        if self.draft.trim().is_empty() {
            self.notice = Some(Notice::inline("Comment cannot be empty"));
            return false;
        }

        let draft = NewComment {
            photo_id: self.photo_id,
            content: self.draft.clone(),
        };
        match self.data.comments().create(&self.session, draft).await {
            Ok(_) => {
                self.draft.clear();
                self.load().await;
                true
            }
            Err(e) => {
                self.notice = Some(Notice::from_error(
                    "Failed to post comment",
                    &e,
                    NoticeKind::Inline,
                ));
                false
            }
        }
    }

    /// Delete a comment; the local list only changes on success.
    pub async fn delete(&mut self, id: CommentId) -> bool {
        match self.data.comments().delete(&self.session, id).await {
            Ok(()) => {
                self.comments.retain(|c| c.id != id);
                self.status = ViewStatus::for_count(self.comments.len());
                true
            }
            Err(e) => {
                self.notice = Some(Notice::from_error(
                    "Failed to delete comment",
                    &e,
                    NoticeKind::Alert,
                ));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    use crate::testing::Harness;
    use photoshare_shared::{NewPhoto, Photo};

    async fn photo(h: &Harness, session: &Session) -> Photo {
        h.ctx
            .storage
            .put(
                session,
                "photos/1-sunset.png",
                Bytes::from_static(b"sunset"),
                "image/png",
            )
            .await
            .unwrap();
        h.ctx
            .data
            .photos()
            .create(
                session,
                NewPhoto {
                    title: "Sunset".into(),
                    description: None,
                    s3_key: "photos/1-sunset.png".into(),
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn blank_comment_is_rejected_locally() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let p = photo(&h, &alice).await;

        let mut thread = CommentThreadController::new(&h.ctx, alice, p.id);
        thread.load().await;
        thread.set_draft("   \n");
        assert!(!thread.post().await);
        assert_eq!(thread.take_notice().unwrap().kind, NoticeKind::Inline);
        assert_eq!(thread.draft(), "   \n");
        assert_eq!(thread.status(), ViewStatus::Empty);
    }

    #[tokio::test]
    async fn posts_appear_newest_first() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let bob = h.signed_in("bob@test.com").await;
        let p = photo(&h, &alice).await;

        let mut a = CommentThreadController::new(&h.ctx, alice.clone(), p.id);
        a.set_draft("first");
        assert!(a.post().await);
        assert_eq!(a.draft(), "");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let mut b = CommentThreadController::new(&h.ctx, bob.clone(), p.id);
        b.set_draft("second");
        assert!(b.post().await);

        a.load().await;
        let contents: Vec<_> = a.comments().iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "first"]);
        assert_eq!(a.comments()[0].username, "bob@test.com");
        assert!(!a.can_delete(&a.comments()[0]));
        assert!(a.can_delete(&a.comments()[1]));
    }

    #[tokio::test]
    async fn non_author_delete_leaves_comment() {
        let h = Harness::new().await;
        let alice = h.signed_in("alice@test.com").await;
        let bob = h.signed_in("bob@test.com").await;
        let p = photo(&h, &alice).await;

        let mut b = CommentThreadController::new(&h.ctx, bob, p.id);
        b.set_draft("bob was here");
        assert!(b.post().await);
        let id = b.comments()[0].id;

        let mut a = CommentThreadController::new(&h.ctx, alice, p.id);
        a.load().await;
        assert!(!a.delete(id).await);
        assert_eq!(a.take_notice().unwrap().kind, NoticeKind::Alert);
        assert_eq!(a.comments().len(), 1);

        a.load().await;
        assert_eq!(a.comments().len(), 1);

        assert!(b.delete(id).await);
        assert!(b.comments().is_empty());
        assert_eq!(b.status(), ViewStatus::Empty);
    }
}
