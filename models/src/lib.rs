// models/src/lib.rs

pub mod errors;
pub mod roles;
pub mod dashboard;

// Declare the 'medical' sub-module
pub mod medical;

// Re-export common core types for convenience when other crates use 'models::*'
pub use errors::{HospitalError, HospitalResult, ValidationError, ValidationResult};
pub use roles::{Capability, Role};

pub use medical::{
    Appointment, AppointmentStatus, Bill, BillItem, BillItemType, LabTest, LabTestStatus,
    Medication, Patient, PaymentStatus, Prescription, PrescriptionMedication, PrescriptionStatus,
    User,
};
