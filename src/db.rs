use chrono::NaiveDateTime;
use rusqlite::types::FromSqlError;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

use crate::errors::{PosError, Result};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp the way the store keeps it (local wall-clock text).
pub fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp inside a rusqlite row closure.
pub fn parse_ts(s: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

/// Parse a stored enum spelling inside a rusqlite row closure.
pub fn parse_enum<T>(value: Option<T>, s: &str) -> rusqlite::Result<T> {
    match value {
        Some(v) => Ok(v),
        None => Err(rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(FromSqlError::Other(
                format!("unknown enum value: {s}").into(),
            )),
        )),
    }
}

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PosError::Internal(format!("connection lock poisoned: {e}")))
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            -- Menu categories
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            -- Menu items; prices in rupees, gst_rate as a percentage
            CREATE TABLE IF NOT EXISTS menu_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                gst_rate REAL NOT NULL DEFAULT 5,
                is_veg INTEGER NOT NULL DEFAULT 1,
                is_available INTEGER NOT NULL DEFAULT 1,
                category_id INTEGER,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (category_id) REFERENCES categories(id)
            );

            -- Orders; money columns are the frozen billing result
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_number TEXT NOT NULL,
                order_type TEXT NOT NULL,
                table_number TEXT,
                token_number INTEGER,
                customer_name TEXT,
                customer_phone TEXT,
                status TEXT NOT NULL DEFAULT 'new',
                subtotal REAL NOT NULL,
                cgst REAL NOT NULL,
                sgst REAL NOT NULL,
                discount REAL NOT NULL DEFAULT 0,
                discount_type TEXT NOT NULL DEFAULT 'percentage',
                grand_total REAL NOT NULL,
                payment_mode TEXT,
                payment_status TEXT NOT NULL DEFAULT 'pending',
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                completed_at TEXT
            );

            -- Order items: menu-item snapshots frozen at order time
            CREATE TABLE IF NOT EXISTS order_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id INTEGER NOT NULL,
                menu_item_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                quantity INTEGER NOT NULL,
                gst_rate REAL NOT NULL,
                FOREIGN KEY (order_id) REFERENCES orders(id)
            );

            -- Staff accounts
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL DEFAULT 'cashier',
                pin TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Login sessions
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            -- Arbitrary settings (JSON values)
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        // Run migrations for existing databases (pass connection to avoid deadlock)
        Self::migrate_conn(&conn)?;

        tracing::info!("database initialized");
        Ok(())
    }

    fn migrate_conn(conn: &Connection) -> Result<()> {
        let columns: Vec<String> = conn
            .prepare("PRAGMA table_info(orders)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|r| r.ok())
            .collect();

        if !columns.contains(&"customer_phone".to_string()) {
            conn.execute("ALTER TABLE orders ADD COLUMN customer_phone TEXT", [])?;
        }
        if !columns.contains(&"completed_at".to_string()) {
            conn.execute("ALTER TABLE orders ADD COLUMN completed_at TEXT", [])?;
        }
        if !columns.contains(&"token_number".to_string()) {
            conn.execute("ALTER TABLE orders ADD COLUMN token_number INTEGER", [])?;
        }

        let item_columns: Vec<String> = conn
            .prepare("PRAGMA table_info(menu_items)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|r| r.ok())
            .collect();

        if !item_columns.contains(&"is_veg".to_string()) {
            conn.execute(
                "ALTER TABLE menu_items ADD COLUMN is_veg INTEGER NOT NULL DEFAULT 1",
                [],
            )?;
        }

        Ok(())
    }
}
