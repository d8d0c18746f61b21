use crate::error::{check_required, BlogError};
use crate::models::{Category, CategoryWithCount, CATEGORY_NAME_MAX_LEN};
use crate::Database;
use anyhow::Result;
use rusqlite::OptionalExtension;

pub fn create_category(db: &Database, name: &str) -> Result<i64> {
    check_required("name", name, CATEGORY_NAME_MAX_LEN)?;
    let conn = db.get()?;
    conn.execute("INSERT INTO categories (name) VALUES (?)", [name])?;
    Ok(conn.last_insert_rowid())
}

pub fn get_category(db: &Database, id: i64) -> Result<Option<Category>> {
    let conn = db.get()?;
    let category = conn
        .query_row(
            "SELECT id, name FROM categories WHERE id = ?",
            [id],
            |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(category)
}

pub fn list_categories(db: &Database) -> Result<Vec<Category>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name, id")?;
    let categories = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn list_categories_with_counts(db: &Database) -> Result<Vec<CategoryWithCount>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(
        r#"
        SELECT c.id, c.name, COUNT(p.id) AS count
        FROM categories c
        LEFT JOIN posts p ON p.category_id = c.id
        GROUP BY c.id
        ORDER BY c.name, c.id
        "#,
    )?;
    let categories = stmt
        .query_map([], |row| {
            Ok(CategoryWithCount {
                category: Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                },
                count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn rename_category(db: &Database, id: i64, name: &str) -> Result<()> {
    check_required("name", name, CATEGORY_NAME_MAX_LEN)?;
    let conn = db.get()?;
    let affected = conn.execute("UPDATE categories SET name = ? WHERE id = ?", (name, id))?;
    if affected == 0 {
        return Err(BlogError::not_found("category", id).into());
    }
    Ok(())
}

/// Deletes the category together with every post filed under it.
pub fn delete_category(db: &Database, id: i64) -> Result<bool> {
    let conn = db.get()?;
    let affected = conn.execute("DELETE FROM categories WHERE id = ?", [id])?;
    Ok(affected > 0)
}
