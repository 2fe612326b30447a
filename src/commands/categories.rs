use crate::db::Database;
use crate::errors::Result;
use crate::models::{Category, CreateCategory};

pub fn get_categories(db: &Database) -> Result<Vec<Category>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(
        "SELECT id, name, sort_order, is_active FROM categories ORDER BY sort_order, name",
    )?;

    let categories = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                sort_order: row.get(2)?,
                is_active: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(categories)
}

pub fn create_category(db: &Database, category: CreateCategory) -> Result<Category> {
    let conn = db.lock()?;

    let sort_order = category.sort_order.unwrap_or(0);

    conn.execute(
        "INSERT INTO categories (name, sort_order) VALUES (?1, ?2)",
        rusqlite::params![category.name, sort_order],
    )?;

    let id = conn.last_insert_rowid();

    Ok(Category {
        id,
        name: category.name,
        sort_order,
        is_active: true,
    })
}

pub fn update_category(db: &Database, category: Category) -> Result<Category> {
    let conn = db.lock()?;

    let changed = conn.execute(
        "UPDATE categories SET name = ?1, sort_order = ?2, is_active = ?3 WHERE id = ?4",
        rusqlite::params![
            category.name,
            category.sort_order,
            category.is_active,
            category.id
        ],
    )?;

    if changed == 0 {
        return Err(crate::errors::PosError::NotFound(format!(
            "category {}",
            category.id
        )));
    }

    Ok(category)
}

pub fn delete_category(db: &Database, id: i64) -> Result<()> {
    let conn = db.lock()?;

    // Detach menu items in this category first
    conn.execute(
        "UPDATE menu_items SET category_id = NULL WHERE category_id = ?1",
        [id],
    )?;

    conn.execute("DELETE FROM categories WHERE id = ?1", [id])?;

    Ok(())
}
