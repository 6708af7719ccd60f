// lib/src/services/test_support.rs
//! Shared fixtures for the service test modules. Password hashes stay
//! empty here; only the authentication tests exercise bcrypt.

use chrono::{NaiveDate, Utc};

use models::medical::{
    Appointment, AppointmentStatus, LabTest, LabTestStatus, Medication, Patient, Prescription,
    PrescriptionMedication, PrescriptionStatus, User,
};
use models::roles::Role;

use crate::access::AuthContext;

pub fn ctx(user_id: i32, role: Role) -> AuthContext {
    AuthContext {
        user_id,
        role,
        is_active: true,
        full_name: "Test User".to_string(),
    }
}

pub fn new_patient(first_name: &str, last_name: &str) -> Patient {
    Patient {
        id: 0,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1984, 3, 2).unwrap(),
        gender: "female".to_string(),
        blood_group: Some("O+".to_string()),
        phone: "555-0101".to_string(),
        email: Some("patient@example.org".to_string()),
        address: None,
        created_at: Utc::now(),
    }
}

pub fn new_user(email: &str, role: Role) -> User {
    User {
        id: 0,
        email: email.to_string(),
        password_hash: String::new(),
        first_name: "Staff".to_string(),
        last_name: "Member".to_string(),
        role,
        is_active: true,
        created_at: Utc::now(),
    }
}

pub fn new_medication(name: &str, unit_price: f64, stock: i32) -> Medication {
    Medication {
        id: 0,
        name: name.to_string(),
        category: "antibiotic".to_string(),
        description: None,
        manufacturer: None,
        unit_price,
        stock_quantity: stock,
        reorder_level: 5,
        created_at: Utc::now(),
    }
}

pub fn scheduled_appointment(patient_id: i32, doctor_id: i32) -> Appointment {
    Appointment {
        id: 0,
        patient_id,
        doctor_id,
        appointment_date: Utc::now(),
        status: AppointmentStatus::Scheduled,
        notes: None,
        diagnosis: None,
        created_at: Utc::now(),
    }
}

pub fn line(medication_id: i32, quantity: i32) -> PrescriptionMedication {
    PrescriptionMedication {
        medication_id,
        dosage: "500mg".to_string(),
        frequency: "twice daily".to_string(),
        duration: "7 days".to_string(),
        quantity,
    }
}

pub fn pending_prescription(
    patient_id: i32,
    doctor_id: i32,
    medications: Vec<PrescriptionMedication>,
) -> Prescription {
    Prescription {
        id: 0,
        patient_id,
        doctor_id,
        diagnosis: "bacterial infection".to_string(),
        notes: None,
        prescription_date: Utc::now(),
        status: PrescriptionStatus::Pending,
        medications,
        dispensed_by: None,
        dispensed_at: None,
        dispensing_notes: None,
    }
}

pub fn pending_lab_test(patient_id: i32, doctor_id: i32) -> LabTest {
    LabTest {
        id: 0,
        patient_id,
        doctor_id,
        test_type: "Complete Blood Count".to_string(),
        status: LabTestStatus::Pending,
        notes: None,
        results: None,
        normal_range: None,
        remarks: None,
        requested_by: None,
        requested_date: Utc::now(),
        completed_by: None,
        completed_date: None,
    }
}
