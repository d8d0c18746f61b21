use crate::error::{check_required, BlogError};
use crate::models::{Tag, TagWithCount, TAG_NAME_MAX_LEN};
use crate::Database;
use anyhow::Result;
use rusqlite::OptionalExtension;

pub fn create_tag(db: &Database, name: &str) -> Result<i64> {
    check_required("name", name, TAG_NAME_MAX_LEN)?;
    let conn = db.get()?;
    conn.execute("INSERT INTO tags (name) VALUES (?)", [name])?;
    Ok(conn.last_insert_rowid())
}

pub fn get_tag(db: &Database, id: i64) -> Result<Option<Tag>> {
    let conn = db.get()?;
    let tag = conn
        .query_row("SELECT id, name FROM tags WHERE id = ?", [id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .optional()?;
    Ok(tag)
}

pub fn list_tags(db: &Database) -> Result<Vec<Tag>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY name, id")?;
    let tags = stmt
        .query_map([], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

pub fn list_tags_with_counts(db: &Database) -> Result<Vec<TagWithCount>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(
        r#"
        SELECT t.id, t.name, COUNT(pt.post_id) AS count
        FROM tags t
        LEFT JOIN post_tags pt ON pt.tag_id = t.id
        GROUP BY t.id
        ORDER BY count DESC, t.name
        "#,
    )?;
    let tags = stmt
        .query_map([], |row| {
            Ok(TagWithCount {
                tag: Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                },
                count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

/// Tags attached to one post, by name.
pub fn tags_for_post(conn: &rusqlite::Connection, post_id: i64) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name FROM tags t JOIN post_tags pt ON t.id = pt.tag_id WHERE pt.post_id = ? ORDER BY t.name, t.id",
    )?;
    let tags = stmt
        .query_map([post_id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

pub fn rename_tag(db: &Database, id: i64, name: &str) -> Result<()> {
    check_required("name", name, TAG_NAME_MAX_LEN)?;
    let conn = db.get()?;
    let affected = conn.execute("UPDATE tags SET name = ? WHERE id = ?", (name, id))?;
    if affected == 0 {
        return Err(BlogError::not_found("tag", id).into());
    }
    Ok(())
}

/// Deletes the tag; posts that carried it simply lose it.
pub fn delete_tag(db: &Database, id: i64) -> Result<bool> {
    let conn = db.get()?;
    let affected = conn.execute("DELETE FROM tags WHERE id = ?", [id])?;
    Ok(affected > 0)
}
