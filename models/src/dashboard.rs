use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::medical::{Appointment, Bill, LabTest, Medication, Prescription};
use crate::roles::Role;

/// Per-role dashboard payloads. These are presentation schemas, not
/// authoritative domain state; every figure is recomputed on request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Dashboard {
    Admin(AdminDashboard),
    Doctor(DoctorDashboard),
    Reception(ReceptionDashboard),
    Pharmacy(PharmacyDashboard),
    Laboratory(LaboratoryDashboard),
}

impl Dashboard {
    pub fn role(&self) -> Role {
        match self {
            Dashboard::Admin(_) => Role::Admin,
            Dashboard::Doctor(_) => Role::Doctor,
            Dashboard::Reception(_) => Role::Receptionist,
            Dashboard::Pharmacy(_) => Role::Pharmacist,
            Dashboard::Laboratory(_) => Role::LabTechnician,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminDashboard {
    pub total_patients: usize,
    pub total_appointments: usize,
    pub total_doctors: usize,
    pub today_appointments: Vec<Appointment>,
    pub recent_bills: Vec<Bill>,
    /// Sum of paid bill totals over the trailing thirty days.
    pub monthly_revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorDashboard {
    pub today_appointments: Vec<Appointment>,
    pub recent_prescriptions: Vec<Prescription>,
    pub recent_lab_results: Vec<LabTest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceptionDashboard {
    pub today_appointments: Vec<Appointment>,
    pub upcoming_appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PharmacyDashboard {
    pub low_stock: Vec<Medication>,
    pub pending_prescriptions: Vec<Prescription>,
    pub recently_dispensed: Vec<Prescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaboratoryDashboard {
    pub pending_tests: Vec<LabTest>,
    pub completed_today: usize,
    pub recent_results: Vec<LabTest>,
}

/// Revenue summary over a date range. Schema-first: consumers decide layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bill_count: usize,
    pub paid_count: usize,
    pub total_billed: f64,
    pub total_collected: f64,
}

/// Appointment volume summary over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub scheduled: usize,
    pub completed: usize,
    pub cancelled: usize,
}

/// Lightweight activity feed entry for the landing dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}
