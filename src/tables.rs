//! Table-status derivation.
//!
//! Tables are not stored; a static layout is mapped against the current
//! order set on every read. A table's active order is the first unpaid
//! order carrying its number — the order flow guarantees at most one such
//! order per table (see `commands::orders::place_order`).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{Order, OrderStatus, PaymentStatus, Table, TableStatus};

/// One slot in the floor layout.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TableSlot {
    pub id: String,
    pub number: String,
    pub section: String,
}

impl TableSlot {
    fn new(id: &str, number: &str, section: &str) -> Self {
        TableSlot {
            id: id.to_string(),
            number: number.to_string(),
            section: section.to_string(),
        }
    }
}

/// Default floor plan: Dine In D1-D15, Roof Top R1-R4, AC Section A1-A6.
pub fn default_layout() -> Vec<TableSlot> {
    let mut layout = Vec::new();
    for n in 1..=15 {
        layout.push(TableSlot::new(
            &format!("d{n}"),
            &format!("D{n}"),
            "Dine In",
        ));
    }
    for n in 1..=4 {
        layout.push(TableSlot::new(
            &format!("r{n}"),
            &format!("R{n}"),
            "Roof Top",
        ));
    }
    for n in 1..=6 {
        layout.push(TableSlot::new(
            &format!("a{n}"),
            &format!("A{n}"),
            "AC Section",
        ));
    }
    layout
}

/// Map the order set onto `layout`, producing one display table per slot.
///
/// No active order -> blank. Active order already served -> printed
/// (bill handed over, awaiting payment). Any other active order ->
/// running. Paid and cancelled orders release the table. The `paid` and
/// `running-kot` display statuses are never produced here; they are
/// reserved for flows that set them directly.
pub fn derive_tables(layout: &[TableSlot], orders: &[Order], now: NaiveDateTime) -> Vec<Table> {
    layout
        .iter()
        .map(|slot| {
            let active = orders.iter().find(|o| {
                o.table_number.as_deref() == Some(slot.number.as_str())
                    && o.payment_status != PaymentStatus::Paid
                    && o.status != OrderStatus::Cancelled
            });

            match active {
                Some(order) => Table {
                    id: slot.id.clone(),
                    number: slot.number.clone(),
                    section: slot.section.clone(),
                    status: if order.status == OrderStatus::Served {
                        TableStatus::Printed
                    } else {
                        TableStatus::Running
                    },
                    amount: Some(order.grand_total),
                    time: Some((now - order.created_at).num_minutes()),
                },
                None => Table {
                    id: slot.id.clone(),
                    number: slot.number.clone(),
                    section: slot.section.clone(),
                    status: TableStatus::Blank,
                    amount: None,
                    time: None,
                },
            }
        })
        .collect()
}
