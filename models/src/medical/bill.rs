// models/src/medical/bill.rs
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillItemType {
    Consultation,
    Medication,
    LabTest,
    Procedure,
}

impl BillItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillItemType::Consultation => "consultation",
            BillItemType::Medication => "medication",
            BillItemType::LabTest => "lab_test",
            BillItemType::Procedure => "procedure",
        }
    }
}

impl fmt::Display for BillItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillItemType {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "consultation" => Ok(BillItemType::Consultation),
            "medication" => Ok(BillItemType::Medication),
            "lab_test" | "lab-test" => Ok(BillItemType::LabTest),
            "procedure" => Ok(BillItemType::Procedure),
            other => Err(ValidationError::InvalidItemType(other.to_string())),
        }
    }
}

/// Payment transitions are one-way: pending → paid or pending → cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Paid)
                | (PaymentStatus::Pending, PaymentStatus::Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chargeable entry on a bill. `total_price` is a snapshot taken at bill
/// creation so later price changes never alter historical bills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub item_type: BillItemType,
    /// Id of the source record (appointment, medication, lab test), if any.
    pub reference_id: Option<i32>,
    pub description: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: i32,
    pub patient_id: i32,
    pub bill_date: DateTime<Utc>,
    /// Snapshot of the sum of item totals at creation time.
    pub total_amount: f64,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub items: Vec<BillItem>,
}

impl Bill {
    /// Recomputes the total from the line items; always equal to
    /// `total_amount` for a well-formed bill.
    pub fn computed_total(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.quantity as f64 * item.unit_price)
            .sum()
    }
}
