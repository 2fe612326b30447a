use chrono::Local;

use crate::commands::settings::{get_setting, set_setting};
use crate::db::Database;
use crate::errors::{PosError, Result};
use crate::models::Table;
use crate::tables::{default_layout, derive_tables, TableSlot};

const LAYOUT_KEY: &str = "table_layout";

/// The floor plan in effect: the one saved in settings, or the default.
pub fn get_table_layout(db: &Database) -> Result<Vec<TableSlot>> {
    match get_setting(db, LAYOUT_KEY)? {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| PosError::Internal(format!("corrupt table layout: {e}"))),
        None => Ok(default_layout()),
    }
}

pub fn save_table_layout(db: &Database, layout: &[TableSlot]) -> Result<()> {
    if layout.is_empty() {
        return Err(PosError::InvalidArgument(
            "table layout must not be empty".to_string(),
        ));
    }

    let value = serde_json::to_value(layout)
        .map_err(|e| PosError::Internal(format!("serialize table layout: {e}")))?;
    set_setting(db, LAYOUT_KEY, &value)
}

/// Current per-table display status, derived from the unpaid order set.
pub fn get_tables(db: &Database) -> Result<Vec<Table>> {
    let layout = get_table_layout(db)?;
    let orders = super::orders::list_orders(db)?;
    let orders: Vec<_> = orders.into_iter().map(|o| o.order).collect();

    Ok(derive_tables(&layout, &orders, Local::now().naive_local()))
}
