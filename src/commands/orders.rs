use chrono::Local;
use rusqlite::Connection;

use crate::billing::{compute_bill, BillLine};
use crate::db::{fmt_ts, parse_enum, parse_ts, Database};
use crate::errors::{PosError, Result};
use crate::models::{
    DiscountType, NewOrder, Order, OrderDestination, OrderItem, OrderStatus, OrderType,
    OrderWithItems, PaymentMode, PaymentStatus,
};
use crate::money::{generate_invoice_number, DEFAULT_INVOICE_PREFIX};

const ORDER_COLUMNS: &str = "id, order_number, order_type, table_number, token_number, \
     customer_name, customer_phone, status, subtotal, cgst, sgst, discount, discount_type, \
     grand_total, payment_mode, payment_status, notes, created_at, updated_at, completed_at";

fn row_to_order(row: &rusqlite::Row) -> rusqlite::Result<Order> {
    let order_type: String = row.get(2)?;
    let status: String = row.get(7)?;
    let discount_type: String = row.get(12)?;
    let payment_mode: Option<String> = row.get(14)?;
    let payment_status: String = row.get(15)?;
    let created_at: String = row.get(17)?;
    let updated_at: String = row.get(18)?;
    let completed_at: Option<String> = row.get(19)?;

    Ok(Order {
        id: row.get(0)?,
        order_number: row.get(1)?,
        order_type: parse_enum(OrderType::parse(&order_type), &order_type)?,
        table_number: row.get(3)?,
        token_number: row.get(4)?,
        customer_name: row.get(5)?,
        customer_phone: row.get(6)?,
        status: parse_enum(OrderStatus::parse(&status), &status)?,
        subtotal: row.get(8)?,
        cgst: row.get(9)?,
        sgst: row.get(10)?,
        discount: row.get(11)?,
        discount_type: parse_enum(DiscountType::parse(&discount_type), &discount_type)?,
        grand_total: row.get(13)?,
        payment_mode: match payment_mode {
            Some(m) => Some(parse_enum(PaymentMode::parse(&m), &m)?),
            None => None,
        },
        payment_status: parse_enum(PaymentStatus::parse(&payment_status), &payment_status)?,
        notes: row.get(16)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
        completed_at: match completed_at {
            Some(ts) => Some(parse_ts(&ts)?),
            None => None,
        },
    })
}

fn items_for_order(conn: &Connection, order_id: i64) -> Result<Vec<OrderItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, order_id, menu_item_id, name, price, quantity, gst_rate
         FROM order_items WHERE order_id = ?1",
    )?;

    let items = stmt
        .query_map([order_id], |row| {
            Ok(OrderItem {
                id: row.get(0)?,
                order_id: row.get(1)?,
                menu_item_id: row.get(2)?,
                name: row.get(3)?,
                price: row.get(4)?,
                quantity: row.get(5)?,
                gst_rate: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(items)
}

/// Place a new order: snapshot the menu items, compute the bill, and
/// persist the whole thing. Dine-in orders are rejected while the table
/// still has an unpaid order on it; takeaway/delivery orders get the next
/// token number for the day.
pub fn place_order(db: &Database, new_order: NewOrder) -> Result<OrderWithItems> {
    if new_order.items.is_empty() {
        return Err(PosError::InvalidArgument(
            "order must contain at least one item".to_string(),
        ));
    }
    for item in &new_order.items {
        if item.quantity < 1 {
            return Err(PosError::InvalidArgument(format!(
                "item quantity must be at least 1, got {}",
                item.quantity
            )));
        }
    }

    let conn = db.lock()?;

    // Snapshot menu items into bill lines
    let mut snapshots: Vec<(i64, String, f64, i32, f64)> = Vec::new();
    for item in &new_order.items {
        let (name, price, gst_rate, is_available): (String, f64, f64, bool) = conn
            .query_row(
                "SELECT name, price, gst_rate, is_available FROM menu_items WHERE id = ?1",
                [item.menu_item_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .map_err(|_| PosError::NotFound(format!("menu item {}", item.menu_item_id)))?;

        if !is_available {
            return Err(PosError::InvalidArgument(format!(
                "menu item '{name}' is not available"
            )));
        }

        snapshots.push((item.menu_item_id, name, price, item.quantity, gst_rate));
    }

    let lines: Vec<BillLine> = snapshots
        .iter()
        .map(|&(_, _, price, quantity, gst_rate)| BillLine {
            price,
            quantity,
            gst_rate,
        })
        .collect();
    let totals = compute_bill(&lines, new_order.discount, new_order.discount_type)?;

    let now = Local::now().naive_local();
    let day_start = format!("{} 00:00:00", now.format("%Y-%m-%d"));

    let (order_type, table_number, token_number, customer_name, customer_phone) =
        match &new_order.destination {
            OrderDestination::DineIn { table_number } => {
                // Enforced invariant: at most one active order per table.
                // Paid and cancelled orders no longer hold the table.
                let occupied: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM orders WHERE table_number = ?1 \
                     AND payment_status != 'paid' AND status != 'cancelled'",
                    [table_number],
                    |row| row.get(0),
                )?;
                if occupied > 0 {
                    return Err(PosError::Conflict(format!(
                        "table {table_number} already has an active order"
                    )));
                }
                (
                    OrderType::DineIn,
                    Some(table_number.clone()),
                    None,
                    None,
                    None,
                )
            }
            OrderDestination::Takeaway { customer_name } => (
                OrderType::Takeaway,
                None,
                Some(next_token(&conn, &day_start)?),
                customer_name.clone(),
                None,
            ),
            OrderDestination::Delivery {
                customer_name,
                customer_phone,
            } => (
                OrderType::Delivery,
                None,
                Some(next_token(&conn, &day_start)?),
                Some(customer_name.clone()),
                customer_phone.clone(),
            ),
        };

    // Highest suffix issued today, so numbers stay distinct even after a
    // deletion. "ORD-yymmdd-" is 11 characters; the suffix starts at 12.
    let seq: i64 = conn.query_row(
        "SELECT COALESCE(MAX(CAST(substr(order_number, 12) AS INTEGER)), 0) \
         FROM orders WHERE created_at >= ?1",
        [&day_start],
        |row| row.get(0),
    )?;
    let order_number = format!("ORD-{}-{:03}", now.format("%y%m%d"), seq + 1);

    conn.execute(
        "INSERT INTO orders (order_number, order_type, table_number, token_number, customer_name, \
         customer_phone, status, subtotal, cgst, sgst, discount, discount_type, grand_total, \
         payment_status, notes, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'new', ?7, ?8, ?9, ?10, ?11, ?12, 'pending', ?13, ?14, ?14)",
        rusqlite::params![
            order_number,
            order_type.as_str(),
            table_number,
            token_number,
            customer_name,
            customer_phone,
            totals.subtotal,
            totals.cgst,
            totals.sgst,
            new_order.discount,
            new_order.discount_type.as_str(),
            totals.grand_total,
            new_order.notes,
            fmt_ts(now),
        ],
    )?;

    let order_id = conn.last_insert_rowid();

    let mut items = Vec::new();
    for (menu_item_id, name, price, quantity, gst_rate) in snapshots {
        conn.execute(
            "INSERT INTO order_items (order_id, menu_item_id, name, price, quantity, gst_rate) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![order_id, menu_item_id, name, price, quantity, gst_rate],
        )?;

        items.push(OrderItem {
            id: conn.last_insert_rowid(),
            order_id,
            menu_item_id,
            name,
            price,
            quantity,
            gst_rate,
        });
    }

    tracing::info!(
        order_number = %order_number,
        order_type = order_type.as_str(),
        grand_total = totals.grand_total,
        "order placed"
    );

    Ok(OrderWithItems {
        order: Order {
            id: order_id,
            order_number,
            order_type,
            table_number,
            token_number,
            customer_name,
            customer_phone,
            status: OrderStatus::New,
            subtotal: totals.subtotal,
            cgst: totals.cgst,
            sgst: totals.sgst,
            discount: new_order.discount,
            discount_type: new_order.discount_type,
            grand_total: totals.grand_total,
            payment_mode: None,
            payment_status: PaymentStatus::Pending,
            notes: new_order.notes,
            created_at: now,
            updated_at: now,
            completed_at: None,
        },
        items,
    })
}

fn next_token(conn: &Connection, day_start: &str) -> Result<i64> {
    let token: i64 = conn.query_row(
        "SELECT COALESCE(MAX(token_number), 0) + 1 FROM orders WHERE created_at >= ?1",
        [day_start],
        |row| row.get(0),
    )?;
    Ok(token)
}

pub fn get_order(db: &Database, id: i64) -> Result<OrderWithItems> {
    let conn = db.lock()?;

    let order = conn
        .query_row(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
            [id],
            row_to_order,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => PosError::NotFound(format!("order {id}")),
            other => other.into(),
        })?;

    let items = items_for_order(&conn, id)?;
    Ok(OrderWithItems { order, items })
}

/// All orders, newest first.
pub fn list_orders(db: &Database) -> Result<Vec<OrderWithItems>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
    ))?;

    let orders = stmt
        .query_map([], row_to_order)?
        .collect::<std::result::Result<Vec<Order>, _>>()?;

    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let items = items_for_order(&conn, order.id)?;
        result.push(OrderWithItems { order, items });
    }

    Ok(result)
}

/// Orders still in the kitchen's hands (not served, not cancelled),
/// oldest first so the display matches cooking order.
pub fn list_kitchen_orders(db: &Database) -> Result<Vec<OrderWithItems>> {
    let conn = db.lock()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE status NOT IN ('served', 'cancelled') \
         ORDER BY created_at ASC, id ASC"
    ))?;

    let orders = stmt
        .query_map([], row_to_order)?
        .collect::<std::result::Result<Vec<Order>, _>>()?;

    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let items = items_for_order(&conn, order.id)?;
        result.push(OrderWithItems { order, items });
    }

    Ok(result)
}

/// Kitchen flow status change. Served and cancelled orders are frozen;
/// reaching served stamps `completed_at`.
pub fn update_order_status(db: &Database, id: i64, new_status: OrderStatus) -> Result<OrderWithItems> {
    let conn = db.lock()?;

    let current: String = conn
        .query_row("SELECT status FROM orders WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .map_err(|_| PosError::NotFound(format!("order {id}")))?;
    let current = parse_enum(OrderStatus::parse(&current), &current)?;

    if current == OrderStatus::Cancelled || current == OrderStatus::Served {
        return Err(PosError::Conflict(format!(
            "order {id} is already {} and cannot change status",
            current.as_str()
        )));
    }

    let now = fmt_ts(Local::now().naive_local());
    if new_status == OrderStatus::Served {
        conn.execute(
            "UPDATE orders SET status = ?1, updated_at = ?2, completed_at = ?2 WHERE id = ?3",
            rusqlite::params![new_status.as_str(), now, id],
        )?;
    } else {
        conn.execute(
            "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![new_status.as_str(), now, id],
        )?;
    }

    drop(conn);
    get_order(db, id)
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct PaymentReceipt {
    pub invoice_number: String,
    pub order: OrderWithItems,
}

/// Record payment on a pending order and hand back the invoice number.
pub fn settle_payment(db: &Database, id: i64, mode: PaymentMode) -> Result<PaymentReceipt> {
    let conn = db.lock()?;

    let (status, payment_status): (String, String) = conn
        .query_row(
            "SELECT status, payment_status FROM orders WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|_| PosError::NotFound(format!("order {id}")))?;

    if payment_status == PaymentStatus::Paid.as_str() {
        return Err(PosError::Conflict(format!("order {id} is already paid")));
    }
    if status == OrderStatus::Cancelled.as_str() {
        return Err(PosError::Conflict(format!(
            "order {id} is cancelled and cannot be paid"
        )));
    }

    let now = fmt_ts(Local::now().naive_local());
    conn.execute(
        "UPDATE orders SET payment_status = 'paid', payment_mode = ?1, updated_at = ?2, \
         completed_at = COALESCE(completed_at, ?2) WHERE id = ?3",
        rusqlite::params![mode.as_str(), now, id],
    )?;

    drop(conn);

    let invoice_number = generate_invoice_number(DEFAULT_INVOICE_PREFIX);
    let order = get_order(db, id)?;

    tracing::info!(
        order_number = %order.order.order_number,
        invoice_number = %invoice_number,
        mode = mode.as_str(),
        "payment settled"
    );

    Ok(PaymentReceipt {
        invoice_number,
        order,
    })
}

/// Administrative history removal; the only path that deletes an order.
pub fn delete_order(db: &Database, id: i64) -> Result<()> {
    let conn = db.lock()?;

    conn.execute("DELETE FROM order_items WHERE order_id = ?1", [id])?;
    let changed = conn.execute("DELETE FROM orders WHERE id = ?1", [id])?;

    if changed == 0 {
        return Err(PosError::NotFound(format!("order {id}")));
    }

    tracing::warn!(order_id = id, "order removed from history");
    Ok(())
}
