// models/src/medical/medication.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pharmacy stock item. `stock_quantity` is never negative; it is mutated
/// only by dispensing and explicit stock adjustments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub unit_price: f64,
    pub stock_quantity: i32,
    pub reorder_level: i32,
    pub created_at: DateTime<Utc>,
}

impl Medication {
    pub fn has_stock(&self, quantity: i32) -> bool {
        self.stock_quantity >= quantity
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.reorder_level
    }
}
