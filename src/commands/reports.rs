use serde::Serialize;

use crate::db::{fmt_ts, Database};
use crate::errors::Result;
use crate::export::to_csv;
use crate::models::{DailySales, HourBucket, Order, OrderWithItems, TopItem};
use crate::reports::{peak_hours, sales_summary, top_items, DateRange};

fn all_orders(db: &Database) -> Result<Vec<OrderWithItems>> {
    super::orders::list_orders(db)
}

/// Sales fold over the orders matching `range`.
pub fn get_sales_summary(db: &Database, range: DateRange) -> Result<DailySales> {
    let orders = all_orders(db)?;
    Ok(sales_summary(orders.iter().map(|o| &o.order), &range))
}

/// Five best-selling items by quantity across the whole history.
pub fn get_top_items(db: &Database) -> Result<Vec<TopItem>> {
    let orders = all_orders(db)?;
    Ok(top_items(&orders))
}

/// 24 hourly buckets of order counts.
pub fn get_peak_hours(db: &Database) -> Result<Vec<HourBucket>> {
    let orders = all_orders(db)?;
    Ok(peak_hours(orders.iter().map(|o| &o.order)))
}

/// Order history filtered by date range, newest first.
pub fn get_orders_in_range(db: &Database, range: DateRange) -> Result<Vec<OrderWithItems>> {
    let orders = all_orders(db)?;
    Ok(orders
        .into_iter()
        .filter(|o| range.contains(o.order.created_at))
        .collect())
}

/// Flat per-order export row. Field order here is the CSV column order.
#[derive(Debug, Serialize)]
struct OrderExportRow {
    order_number: String,
    created_at: String,
    order_type: &'static str,
    table_number: Option<String>,
    token_number: Option<i64>,
    status: &'static str,
    subtotal: f64,
    discount: f64,
    cgst: f64,
    sgst: f64,
    grand_total: f64,
    payment_mode: Option<&'static str>,
    payment_status: &'static str,
}

impl From<&Order> for OrderExportRow {
    fn from(order: &Order) -> Self {
        OrderExportRow {
            order_number: order.order_number.clone(),
            created_at: fmt_ts(order.created_at),
            order_type: order.order_type.as_str(),
            table_number: order.table_number.clone(),
            token_number: order.token_number,
            status: order.status.as_str(),
            subtotal: order.subtotal,
            discount: order.discount,
            cgst: order.cgst,
            sgst: order.sgst,
            grand_total: order.grand_total,
            payment_mode: order.payment_mode.map(|m| m.as_str()),
            payment_status: order.payment_status.as_str(),
        }
    }
}

/// CSV dump of the order history matching `range`.
pub fn export_orders_csv(db: &Database, range: DateRange) -> Result<String> {
    let orders = get_orders_in_range(db, range)?;
    let rows: Vec<OrderExportRow> = orders.iter().map(|o| OrderExportRow::from(&o.order)).collect();
    to_csv(&rows)
}
