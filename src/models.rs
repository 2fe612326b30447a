use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub sort_order: i32,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
    /// GST percentage (typically 5 or 18 for restaurants)
    pub gst_rate: f64,
    pub is_veg: bool,
    pub is_available: bool,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMenuItem {
    pub name: String,
    pub price: f64,
    pub gst_rate: f64,
    pub is_veg: bool,
    pub category_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateMenuItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub gst_rate: f64,
    pub is_veg: bool,
    pub is_available: bool,
    pub category_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    DineIn,
    Takeaway,
    Delivery,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::DineIn => "dine-in",
            OrderType::Takeaway => "takeaway",
            OrderType::Delivery => "delivery",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dine-in" => Some(OrderType::DineIn),
            "takeaway" => Some(OrderType::Takeaway),
            "delivery" => Some(OrderType::Delivery),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Served => "served",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(OrderStatus::New),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "served" => Some(OrderStatus::Served),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Upi,
    Card,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
            PaymentMode::Card => "card",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMode::Cash),
            "upi" => Some(PaymentMode::Upi),
            "card" => Some(PaymentMode::Card),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Amount,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Amount => "amount",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "percentage" => Some(DiscountType::Percentage),
            "amount" => Some(DiscountType::Amount),
            _ => None,
        }
    }
}

/// Denormalized snapshot of a menu item at order time. Frozen once the
/// order is placed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub gst_rate: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub order_type: OrderType,
    /// Set for dine-in orders.
    pub table_number: Option<String>,
    /// Daily queue number, set for takeaway/delivery orders.
    pub token_number: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub status: OrderStatus,
    pub subtotal: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub discount: f64,
    pub discount_type: DiscountType,
    pub grand_total: f64,
    pub payment_mode: Option<PaymentMode>,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Where a new order is headed. Each variant carries only the fields that
/// make sense for that order type: dine-in orders sit at a table,
/// takeaway/delivery orders get a daily token number instead.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OrderDestination {
    DineIn {
        table_number: String,
    },
    Takeaway {
        customer_name: Option<String>,
    },
    Delivery {
        customer_name: String,
        customer_phone: Option<String>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub menu_item_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewOrder {
    pub destination: OrderDestination,
    pub items: Vec<NewOrderItem>,
    pub discount: f64,
    pub discount_type: DiscountType,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TableStatus {
    Blank,
    Running,
    Printed,
    Paid,
    RunningKot,
}

/// Display-only entity, recomputed from the order set on every read.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Table {
    pub id: String,
    pub number: String,
    pub section: String,
    pub status: TableStatus,
    pub amount: Option<f64>,
    /// Minutes since the active order was created.
    pub time: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailySales {
    pub total_orders: i64,
    pub total_revenue: f64,
    pub cash_amount: f64,
    pub upi_amount: f64,
    pub card_amount: f64,
    pub cgst_collected: f64,
    pub sgst_collected: f64,
}

impl Default for DailySales {
    fn default() -> Self {
        DailySales {
            total_orders: 0,
            total_revenue: 0.0,
            cash_amount: 0.0,
            upi_amount: 0.0,
            card_amount: 0.0,
            cgst_collected: 0.0,
            sgst_collected: 0.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TopItem {
    pub name: String,
    pub quantity: i64,
    pub revenue: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HourBucket {
    pub hour: u32,
    pub count: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Cashier,
    Kitchen,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Cashier => "cashier",
            UserRole::Kitchen => "kitchen",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "cashier" => Some(UserRole::Cashier),
            "kitchen" => Some(UserRole::Kitchen),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub role: UserRole,
    pub pin: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub role: UserRole,
    pub pin: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub started_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
}
