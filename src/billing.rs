//! Bill computation: subtotal, discount clamping, and the proportional
//! GST scale-down.
//!
//! Menu items may carry different GST rates (5% vs 18%), so tax is
//! computed per line on the pre-discount extended price and summed. The
//! discount is assumed to apply uniformly across the bill, so the summed
//! tax is scaled by the post-discount ratio rather than recomputed per
//! discounted line.

use serde::{Deserialize, Serialize};

use crate::errors::{PosError, Result};
use crate::models::{DiscountType, OrderItem};
use crate::money::calculate_gst;

/// One bill line: the order-time snapshot fields the math needs.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BillLine {
    pub price: f64,
    pub quantity: i32,
    pub gst_rate: f64,
}

impl From<&OrderItem> for BillLine {
    fn from(item: &OrderItem) -> Self {
        BillLine {
            price: item.price,
            quantity: item.quantity,
            gst_rate: item.gst_rate,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BillTotals {
    pub subtotal: f64,
    pub discount_amount: f64,
    pub after_discount: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub grand_total: f64,
}

/// Compute bill totals for `lines` with the given discount.
///
/// Invariant: `grand_total == after_discount + cgst + sgst`, where cgst and
/// sgst are the per-line sums scaled by `after_discount / subtotal`. The
/// discount amount is clamped to the subtotal, so `after_discount` is never
/// negative.
pub fn compute_bill(
    lines: &[BillLine],
    discount_value: f64,
    discount_type: DiscountType,
) -> Result<BillTotals> {
    if discount_value < 0.0 {
        return Err(PosError::InvalidArgument(format!(
            "discount must be non-negative, got {discount_value}"
        )));
    }

    let mut subtotal = 0.0;
    let mut raw_cgst = 0.0;
    let mut raw_sgst = 0.0;

    for line in lines {
        if line.price < 0.0 {
            return Err(PosError::InvalidArgument(format!(
                "line price must be non-negative, got {}",
                line.price
            )));
        }
        if line.quantity < 0 {
            return Err(PosError::InvalidArgument(format!(
                "line quantity must be non-negative, got {}",
                line.quantity
            )));
        }

        let extended = line.price * line.quantity as f64;
        let gst = calculate_gst(extended, line.gst_rate)?;

        subtotal += extended;
        raw_cgst += gst.cgst;
        raw_sgst += gst.sgst;
    }

    let discount_amount = match discount_type {
        DiscountType::Percentage => subtotal * discount_value / 100.0,
        DiscountType::Amount => discount_value,
    };
    // An over-large discount is clamped rather than driving the bill negative.
    let discount_amount = discount_amount.min(subtotal);

    let after_discount = subtotal - discount_amount;

    let ratio = if subtotal > 0.0 {
        after_discount / subtotal
    } else {
        1.0
    };
    let cgst = raw_cgst * ratio;
    let sgst = raw_sgst * ratio;

    Ok(BillTotals {
        subtotal,
        discount_amount,
        after_discount,
        cgst,
        sgst,
        grand_total: after_discount + cgst + sgst,
    })
}
