// models/src/medical/prescription.rs
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    Pending,
    Dispensed,
}

impl PrescriptionStatus {
    /// Dispensed is terminal; a prescription never reverts to pending.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PrescriptionStatus::Dispensed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrescriptionStatus::Pending => "pending",
            PrescriptionStatus::Dispensed => "dispensed",
        }
    }
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrescriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PrescriptionStatus::Pending),
            "dispensed" => Ok(PrescriptionStatus::Dispensed),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// One medication line within a prescription. Lines are created with the
/// prescription and are immutable once it is dispensed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionMedication {
    pub medication_id: i32,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: i32,
    pub patient_id: i32,
    pub doctor_id: i32,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub prescription_date: DateTime<Utc>,
    pub status: PrescriptionStatus,
    /// Medication lines in the order the doctor submitted them.
    pub medications: Vec<PrescriptionMedication>,
    pub dispensed_by: Option<i32>,
    pub dispensed_at: Option<DateTime<Utc>>,
    pub dispensing_notes: Option<String>,
}

impl Prescription {
    pub fn is_pending(&self) -> bool {
        self.status == PrescriptionStatus::Pending
    }
}
