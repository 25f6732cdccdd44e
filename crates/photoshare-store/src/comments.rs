use rusqlite::params;

use photoshare_shared::{Comment, CommentId, PhotoId, UserId};

use crate::database::{ts_from_sql, ts_to_sql, uuid_from_sql, Database};
use crate::error::Result;

const COMMENT_COLUMNS: &str = "id, photo_id, user_id, username, content, created_at";

impl Database {
    pub fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.conn().execute(
            "INSERT INTO comments (id, photo_id, user_id, username, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                comment.id.to_string(),
                comment.photo_id.to_string(),
                comment.user_id.to_string(),
                comment.username,
                comment.content,
                ts_to_sql(&comment.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_comment(&self, id: CommentId) -> Result<Comment> {
        let comment = self.conn().query_row(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
            params![id.to_string()],
            row_to_comment,
        )?;
        Ok(comment)
    }

    /// Comments newest first, optionally restricted to one photo.
    pub fn list_comments(&self, photo_id: Option<PhotoId>) -> Result<Vec<Comment>> {
        let mut comments = Vec::new();

        match photo_id {
            Some(photo_id) => {
                let mut stmt = self.conn().prepare(&format!(
                    "SELECT {COMMENT_COLUMNS} FROM comments
                     WHERE photo_id = ?1
                     ORDER BY created_at DESC"
                ))?;
                let rows = stmt.query_map(params![photo_id.to_string()], row_to_comment)?;
                for row in rows {
                    comments.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn().prepare(&format!(
                    "SELECT {COMMENT_COLUMNS} FROM comments ORDER BY created_at DESC"
                ))?;
                let rows = stmt.query_map([], row_to_comment)?;
                for row in rows {
                    comments.push(row?);
                }
            }
        }

        Ok(comments)
    }

    pub fn delete_comment(&self, id: CommentId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM comments WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let id_str: String = row.get(0)?;
    let photo_str: String = row.get(1)?;
    let user_str: String = row.get(2)?;
    let username: String = row.get(3)?;
    let content: String = row.get(4)?;
    let created_str: String = row.get(5)?;

    Ok(Comment {
        id: CommentId(uuid_from_sql(0, &id_str)?),
        photo_id: PhotoId(uuid_from_sql(1, &photo_str)?),
        user_id: UserId(uuid_from_sql(2, &user_str)?),
        username,
        content,
        created_at: ts_from_sql(5, &created_str)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::error::StoreError;
    use photoshare_shared::Photo;

    fn seed_photo(db: &Database, key: &str) -> PhotoId {
        let photo = Photo {
            id: PhotoId::new(),
            user_id: UserId::new(),
            title: "t".into(),
            description: Some("d".into()),
            s3_key: key.into(),
            uploaded_at: Utc::now(),
        };
        db.insert_photo(&photo).unwrap();
        photo.id
    }

    fn comment(photo_id: PhotoId, text: &str, minutes_ago: i64) -> Comment {
        Comment {
            id: CommentId::new(),
            photo_id,
            user_id: UserId::new(),
            username: "user@test.com".into(),
            content: text.into(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn filter_by_photo() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_photo(&db, "photos/1-a.png");
        let b = seed_photo(&db, "photos/2-b.png");

        let older = comment(a, "first", 5);
        let newer = comment(a, "second", 1);
        db.insert_comment(&older).unwrap();
        db.insert_comment(&newer).unwrap();
        db.insert_comment(&comment(b, "elsewhere", 0)).unwrap();

        let on_a = db.list_comments(Some(a)).unwrap();
        assert_eq!(on_a.len(), 2);
        assert_eq!(on_a[0].id, newer.id);
        assert_eq!(db.list_comments(None).unwrap().len(), 3);
    }

    #[test]
    fn comment_requires_existing_photo() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .insert_comment(&comment(PhotoId::new(), "orphan", 0))
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[test]
    fn photo_delete_cascades() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_photo(&db, "photos/1-a.png");
        let c = comment(a, "bye", 0);
        db.insert_comment(&c).unwrap();

        db.delete_photo(a).unwrap();
        assert!(matches!(db.get_comment(c.id), Err(StoreError::NotFound)));
    }

    #[test]
    fn delete_reports_affected() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_photo(&db, "photos/1-a.png");
        let c = comment(a, "x", 0);
        db.insert_comment(&c).unwrap();

        assert!(db.delete_comment(c.id).unwrap());
        assert!(!db.delete_comment(c.id).unwrap());
    }
}
