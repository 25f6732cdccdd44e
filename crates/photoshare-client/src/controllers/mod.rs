//! View controllers, one per page.
//!
//! Each controller owns its local view state and talks to the backend only
//! through the clients in [`AppContext`](crate::state::AppContext).  Remote
//! failures are logged and surfaced as a [`Notice`]; they never escape as
//! errors.

pub mod comments;
pub mod detail;
pub mod gallery;
pub mod signin;
pub mod signup;
pub mod upload;

use tracing::{info, warn};

use photoshare_shared::{Photo, Session};

use crate::data_client::DataClient;
use crate::storage::StorageClient;
use crate::view::{Notice, NoticeKind};

/// Delete a photo's object, then its record.
///
/// An object that is already gone does not stop the record delete.  Any
/// other object-store failure aborts before the record is touched.  Not
/// atomic: a failed record delete after the object delete leaves a record
/// pointing at nothing.
pub(crate) async fn delete_photo(
    data: &DataClient,
    storage: &StorageClient,
    session: &Session,
    photo: &Photo,
) -> Result<(), Notice> {
    match storage.delete(session, &photo.s3_key).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            warn!(photo_id = %photo.id, path = %photo.s3_key, "Object already gone, deleting record");
        }
        Err(e) => {
            return Err(Notice::from_error(
                "Failed to delete photo",
                &e,
                NoticeKind::Alert,
            ))
        }
    }

    if let Err(e) = data.photos().delete(session, photo.id).await {
        warn!(photo_id = %photo.id, "Object deleted but record remains");
        return Err(Notice::from_error(
            "Failed to delete photo",
            &e,
            NoticeKind::Alert,
        ));
    }

    info!(photo_id = %photo.id, "Photo deleted");
    Ok(())
}
