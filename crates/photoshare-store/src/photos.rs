use rusqlite::params;

use photoshare_shared::{Photo, PhotoId, UserId};

use crate::database::{ts_from_sql, ts_to_sql, uuid_from_sql, Database};
use crate::error::Result;

const PHOTO_COLUMNS: &str = "id, user_id, title, description, s3_key, uploaded_at";

impl Database {
    pub fn insert_photo(&self, photo: &Photo) -> Result<()> {
        self.conn().execute(
            "INSERT INTO photos (id, user_id, title, description, s3_key, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                photo.id.to_string(),
                photo.user_id.to_string(),
                photo.title,
                photo.description,
                photo.s3_key,
                ts_to_sql(&photo.uploaded_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_photo(&self, id: PhotoId) -> Result<Photo> {
        let photo = self.conn().query_row(
            &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?1"),
            params![id.to_string()],
            row_to_photo,
        )?;
        Ok(photo)
    }

    pub fn photo_exists(&self, id: PhotoId) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM photos WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Every photo, newest upload first.
    pub fn list_photos(&self) -> Result<Vec<Photo>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos ORDER BY uploaded_at DESC"
        ))?;

        let rows = stmt.query_map([], row_to_photo)?;

        let mut photos = Vec::new();
        for row in rows {
            photos.push(row?);
        }
        Ok(photos)
    }

    // removes the record and, by cascade, its comments; the object is untouched
    pub fn delete_photo(&self, id: PhotoId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM photos WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn row_to_photo(row: &rusqlite::Row<'_>) -> rusqlite::Result<Photo> {
    let id_str: String = row.get(0)?;
    let user_str: String = row.get(1)?;
    let title: String = row.get(2)?;
    let description: Option<String> = row.get(3)?;
    let s3_key: String = row.get(4)?;
    let uploaded_str: String = row.get(5)?;

    Ok(Photo {
        id: PhotoId(uuid_from_sql(0, &id_str)?),
        user_id: UserId(uuid_from_sql(1, &user_str)?),
        title,
        description,
        s3_key,
        uploaded_at: ts_from_sql(5, &uploaded_str)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::error::StoreError;

    fn photo(key: &str, minutes_ago: i64) -> Photo {
        Photo {
            id: PhotoId::new(),
            user_id: UserId::new(),
            title: format!("title {key}"),
            description: None,
            s3_key: key.to_string(),
            uploaded_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn insert_get_delete() {
        let db = Database::open_in_memory().unwrap();
        let p = photo("photos/1-a.png", 0);

        db.insert_photo(&p).unwrap();
        assert_eq!(db.get_photo(p.id).unwrap(), p);
        assert!(db.photo_exists(p.id).unwrap());

        assert!(db.delete_photo(p.id).unwrap());
        assert!(!db.delete_photo(p.id).unwrap());
        assert!(matches!(db.get_photo(p.id), Err(StoreError::NotFound)));
    }

    #[test]
    fn list_is_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let old = photo("photos/1-old.png", 10);
        let new = photo("photos/2-new.png", 1);
        db.insert_photo(&old).unwrap();
        db.insert_photo(&new).unwrap();

        let ids: Vec<_> = db.list_photos().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);
    }

    #[test]
    fn duplicate_key_is_a_constraint_error() {
        let db = Database::open_in_memory().unwrap();
        db.insert_photo(&photo("photos/1-a.png", 0)).unwrap();
        let err = db.insert_photo(&photo("photos/1-a.png", 0)).unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }
}
