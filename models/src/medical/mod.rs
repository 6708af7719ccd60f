// models/src/medical/mod.rs

pub mod appointment;
pub mod bill;
pub mod lab_test;
pub mod medication;
pub mod patient;
pub mod prescription;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus};
pub use bill::{Bill, BillItem, BillItemType, PaymentStatus};
pub use lab_test::{LabTest, LabTestStatus};
pub use medication::Medication;
pub use patient::Patient;
pub use prescription::{Prescription, PrescriptionMedication, PrescriptionStatus};
pub use user::User;
