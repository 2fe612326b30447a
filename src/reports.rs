//! Sales aggregation over the order set.
//!
//! Everything here is a pure fold over in-memory orders; the data volumes
//! a single restaurant produces are small enough that recomputing on every
//! read beats maintaining incremental aggregates.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::models::{DailySales, HourBucket, Order, OrderWithItems, PaymentMode, TopItem};

/// Inclusive calendar-day range filter. `from` starts at 00:00:00 of its
/// day; `to` runs through the end of its day. With no `from` the filter
/// matches everything (`to` alone is not applied).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn all() -> Self {
        DateRange::default()
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let from = match self.from {
            Some(from) => from,
            None => return true,
        };
        if at.date() < from {
            return false;
        }
        match self.to {
            Some(to) => at.date() <= to,
            None => true,
        }
    }
}

/// Fold orders matching `range` into a sales summary. Orders with no
/// payment mode still count toward revenue but land in no mode bucket.
pub fn sales_summary<'a, I>(orders: I, range: &DateRange) -> DailySales
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut sales = DailySales::default();

    for order in orders {
        if !range.contains(order.created_at) {
            continue;
        }

        sales.total_orders += 1;
        sales.total_revenue += order.grand_total;

        match order.payment_mode {
            Some(PaymentMode::Cash) => sales.cash_amount += order.grand_total,
            Some(PaymentMode::Upi) => sales.upi_amount += order.grand_total,
            Some(PaymentMode::Card) => sales.card_amount += order.grand_total,
            None => {}
        }

        sales.cgst_collected += order.cgst;
        sales.sgst_collected += order.sgst;
    }

    sales
}

/// Top 5 items across all orders, grouped by display name (two menu items
/// with the same name merge), sorted by quantity sold. The sort is stable,
/// so ties keep first-encountered order.
pub fn top_items(orders: &[OrderWithItems]) -> Vec<TopItem> {
    let mut acc: Vec<TopItem> = Vec::new();

    for order in orders {
        for item in &order.items {
            let revenue = item.price * item.quantity as f64;
            match acc.iter_mut().find(|t| t.name == item.name) {
                Some(entry) => {
                    entry.quantity += item.quantity as i64;
                    entry.revenue += revenue;
                }
                None => acc.push(TopItem {
                    name: item.name.clone(),
                    quantity: item.quantity as i64,
                    revenue,
                }),
            }
        }
    }

    acc.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    acc.truncate(5);
    acc
}

/// Bucket orders into 24 hourly counts keyed by the local hour of
/// `created_at`. Always returns exactly 24 entries, hours 0 through 23,
/// zero-filled.
pub fn peak_hours<'a, I>(orders: I) -> Vec<HourBucket>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut counts = [0u32; 24];
    for order in orders {
        counts[order.created_at.hour() as usize] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(hour, &count)| HourBucket {
            hour: hour as u32,
            count,
        })
        .collect()
}
