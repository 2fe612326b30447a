use crate::db::Database;
use crate::errors::{PosError, Result};
use crate::models::{CreateMenuItem, MenuItem, UpdateMenuItem};

const ITEM_COLUMNS: &str = "m.id, m.name, m.price, m.gst_rate, m.is_veg, m.is_available, \
     m.category_id, c.name, m.created_at";

fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<MenuItem> {
    Ok(MenuItem {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        gst_rate: row.get(3)?,
        is_veg: row.get(4)?,
        is_available: row.get(5)?,
        category_id: row.get(6)?,
        category_name: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn validate_item(name: &str, price: f64, gst_rate: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PosError::InvalidArgument(
            "item name must not be empty".to_string(),
        ));
    }
    if price < 0.0 {
        return Err(PosError::InvalidArgument(format!(
            "price must be non-negative, got {price}"
        )));
    }
    if !(0.0..=100.0).contains(&gst_rate) {
        return Err(PosError::InvalidArgument(format!(
            "gst_rate must be between 0 and 100, got {gst_rate}"
        )));
    }
    Ok(())
}

pub fn get_menu_items(db: &Database) -> Result<Vec<MenuItem>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS}
         FROM menu_items m
         LEFT JOIN categories c ON m.category_id = c.id
         ORDER BY m.name"
    ))?;

    let items = stmt
        .query_map([], row_to_item)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(items)
}

/// Items the customer-facing menu actually shows.
pub fn get_available_items(db: &Database) -> Result<Vec<MenuItem>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS}
         FROM menu_items m
         LEFT JOIN categories c ON m.category_id = c.id
         WHERE m.is_available = 1
         ORDER BY m.name"
    ))?;

    let items = stmt
        .query_map([], row_to_item)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(items)
}

pub fn get_menu_item(db: &Database, id: i64) -> Result<MenuItem> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS}
         FROM menu_items m
         LEFT JOIN categories c ON m.category_id = c.id
         WHERE m.id = ?1"
    ))?;

    stmt.query_row([id], row_to_item)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                PosError::NotFound(format!("menu item {id}"))
            }
            other => other.into(),
        })
}

pub fn create_menu_item(db: &Database, item: CreateMenuItem) -> Result<MenuItem> {
    validate_item(&item.name, item.price, item.gst_rate)?;

    let conn = db.lock()?;

    conn.execute(
        "INSERT INTO menu_items (name, price, gst_rate, is_veg, category_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![item.name, item.price, item.gst_rate, item.is_veg, item.category_id],
    )?;

    let id = conn.last_insert_rowid();
    drop(conn);

    get_menu_item(db, id)
}

pub fn update_menu_item(db: &Database, item: UpdateMenuItem) -> Result<MenuItem> {
    validate_item(&item.name, item.price, item.gst_rate)?;

    let conn = db.lock()?;

    let changed = conn.execute(
        "UPDATE menu_items SET name = ?1, price = ?2, gst_rate = ?3, is_veg = ?4, is_available = ?5, category_id = ?6 WHERE id = ?7",
        rusqlite::params![
            item.name,
            item.price,
            item.gst_rate,
            item.is_veg,
            item.is_available,
            item.category_id,
            item.id
        ],
    )?;

    if changed == 0 {
        return Err(PosError::NotFound(format!("menu item {}", item.id)));
    }

    drop(conn);
    get_menu_item(db, item.id)
}

pub fn set_item_availability(db: &Database, id: i64, is_available: bool) -> Result<MenuItem> {
    let conn = db.lock()?;

    let changed = conn.execute(
        "UPDATE menu_items SET is_available = ?1 WHERE id = ?2",
        rusqlite::params![is_available, id],
    )?;

    if changed == 0 {
        return Err(PosError::NotFound(format!("menu item {id}")));
    }

    drop(conn);
    get_menu_item(db, id)
}

pub fn delete_menu_item(db: &Database, id: i64) -> Result<()> {
    let conn = db.lock()?;

    conn.execute("DELETE FROM menu_items WHERE id = ?1", [id])?;

    Ok(())
}
