//! GST arithmetic and rupee formatting.
//!
//! Amounts are kept as raw f64 here; rounding to 2 decimal places is a
//! display concern and happens only in `format_inr`.

use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{PosError, Result};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GstBreakdown {
    pub cgst: f64,
    pub sgst: f64,
    pub total_gst: f64,
}

/// Split GST on `amount` at `gst_rate` percent into equal CGST and SGST
/// halves (intra-state convention). No rounding is applied.
pub fn calculate_gst(amount: f64, gst_rate: f64) -> Result<GstBreakdown> {
    if amount < 0.0 {
        return Err(PosError::InvalidArgument(format!(
            "amount must be non-negative, got {amount}"
        )));
    }
    if gst_rate < 0.0 {
        return Err(PosError::InvalidArgument(format!(
            "gst_rate must be non-negative, got {gst_rate}"
        )));
    }

    let total_gst = amount * gst_rate / 100.0;
    let half = total_gst / 2.0;

    Ok(GstBreakdown {
        cgst: half,
        sgst: half,
        total_gst,
    })
}

/// Format an amount as Indian Rupee: 2 decimal places, grouping by the
/// Indian numbering convention (groups of 2 after the first 3 digits),
/// e.g. `1234567.89` -> `₹12,34,567.89`.
pub fn format_inr(amount: f64) -> String {
    let negative = amount < 0.0;
    let paise_total = (amount.abs() * 100.0).round() as u64;
    let rupees = paise_total / 100;
    let paise = paise_total % 100;

    let formatted = format!("₹{}.{:02}", group_indian(&rupees.to_string()), paise);
    if negative {
        format!("-{formatted}")
    } else {
        formatted
    }
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (h, t) = rest.split_at(rest.len() - 2);
        groups.push(t);
        rest = h;
    }
    groups.push(rest);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

pub const DEFAULT_INVOICE_PREFIX: &str = "INV";

/// Build an invoice number of the form `{prefix}{YY}{MM}{DD}{NNNN}` where
/// `NNNN` is a zero-padded random suffix. Not guaranteed unique; callers
/// that need uniqueness must deduplicate against stored invoices.
pub fn generate_invoice_number(prefix: &str) -> String {
    let date = Local::now();
    let suffix: u32 = rand::rng().random_range(0..10_000);
    format!("{}{}{:04}", prefix, date.format("%y%m%d"), suffix)
}
