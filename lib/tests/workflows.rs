// lib/tests/workflows.rs
//! End-to-end workflow tests plus the randomized dispensing and stock
//! properties: dispensing is all-or-nothing, and no sequence of operations
//! ever drives a stock quantity negative.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;

use lib::access::AuthContext;
use lib::commands::StockOperation;
use lib::database::Database;
use lib::notifications::LogMailer;
use lib::reports::PlainTextRenderer;
use lib::services::billing::{BillingService, NewBillItem};
use lib::services::consultation::{
    ConsultationOutcome, ConsultationService, LabRequest, MedicationLine,
};
use lib::services::laboratory::{LaboratoryService, ResultEntry};
use lib::services::patients::{NewPatient, PatientService};
use lib::services::pharmacy::PharmacyService;
use lib::services::scheduling::{NewAppointment, SchedulingService};

use models::medical::{
    AppointmentStatus, BillItemType, LabTestStatus, Medication, PaymentStatus, Prescription,
    PrescriptionMedication, PrescriptionStatus, User,
};
use models::roles::Role;
use models::HospitalError;

fn ctx(user_id: i32, role: Role) -> AuthContext {
    AuthContext {
        user_id,
        role,
        is_active: true,
        full_name: "Test User".to_string(),
    }
}

fn staff(email: &str, role: Role) -> User {
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

fn medication(name: &str, stock: i32) -> Medication {
    Medication {
        id: 0,
        name: name.to_string(),
        category: "general".to_string(),
        description: None,
        manufacturer: None,
        unit_price: 2.5,
        stock_quantity: stock,
        reorder_level: 5,
        created_at: Utc::now(),
    }
}

fn prescription(patient_id: i32, doctor_id: i32, lines: Vec<(i32, i32)>) -> Prescription {
    Prescription {
        id: 0,
        patient_id,
        doctor_id,
        diagnosis: "test diagnosis".to_string(),
        notes: None,
        prescription_date: Utc::now(),
        status: PrescriptionStatus::Pending,
        medications: lines
            .into_iter()
            .map(|(medication_id, quantity)| PrescriptionMedication {
                medication_id,
                dosage: "1 tablet".to_string(),
                frequency: "daily".to_string(),
                duration: "7 days".to_string(),
                quantity,
            })
            .collect(),
        dispensed_by: None,
        dispensed_at: None,
        dispensing_notes: None,
    }
}

/// The whole patient journey: registration, scheduling, consultation,
/// dispensing, lab results, billing, payment.
#[tokio::test]
async fn should_carry_a_patient_through_the_full_workflow() {
    let db = Database::in_memory();
    let patients = PatientService::new(db.clone());
    let scheduling = SchedulingService::new(db.clone(), Arc::new(LogMailer));
    let consultations = ConsultationService::new(db.clone());
    let pharmacy = PharmacyService::new(db.clone());
    let renderer = Arc::new(PlainTextRenderer::new("County General"));
    let laboratory = LaboratoryService::new(db.clone(), renderer.clone());
    let billing = BillingService::new(db.clone(), renderer);

    let doctor = db.storage.insert_user(staff("doc@example.org", Role::Doctor)).await.unwrap();
    let receptionist = ctx(90, Role::Receptionist);
    let doctor_ctx = ctx(doctor.id, Role::Doctor);
    let pharmacist = ctx(91, Role::Pharmacist);
    let technician = ctx(92, Role::LabTechnician);

    let patient = patients
        .register_patient(
            &receptionist,
            NewPatient {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1984, 3, 2).unwrap(),
                gender: "female".to_string(),
                blood_group: Some("O+".to_string()),
                phone: "555-0101".to_string(),
                email: Some("jane@example.org".to_string()),
                address: None,
            },
        )
        .await
        .unwrap();

    let appointment = scheduling
        .schedule_appointment(
            &receptionist,
            NewAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                appointment_date: Utc::now(),
                notes: Some("sore throat".to_string()),
            },
        )
        .await
        .unwrap();

    let amoxicillin = db
        .storage
        .insert_medication(medication("Amoxicillin", 20))
        .await
        .unwrap();

    let record = consultations
        .complete_consultation(
            &doctor_ctx,
            appointment.id,
            ConsultationOutcome {
                diagnosis: "strep throat".to_string(),
                notes: None,
                medications: vec![MedicationLine {
                    medication_id: amoxicillin.id,
                    dosage: "500mg".to_string(),
                    frequency: "twice daily".to_string(),
                    duration: "7 days".to_string(),
                    quantity: 14,
                }],
                lab_requests: vec![LabRequest {
                    test_type: "Throat culture".to_string(),
                    notes: None,
                }],
            },
        )
        .await
        .unwrap();
    assert_eq!(record.appointment.status, AppointmentStatus::Completed);

    // Scenario C: completing the same appointment again is illegal.
    let err = consultations
        .complete_consultation(
            &doctor_ctx,
            appointment.id,
            ConsultationOutcome {
                diagnosis: "second thoughts".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HospitalError::InvalidState(_)));

    let rx = record.prescription.unwrap();
    let dispensed = pharmacy.dispense(&pharmacist, rx.id, None).await.unwrap();
    assert_eq!(dispensed.status, PrescriptionStatus::Dispensed);
    assert_eq!(
        db.storage
            .get_medication(amoxicillin.id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity,
        6
    );

    let lab_test = &record.lab_tests[0];
    let completed = laboratory
        .record_result(
            &technician,
            lab_test.id,
            ResultEntry {
                results: "positive for strep".to_string(),
                normal_range: None,
                remarks: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(completed.status, LabTestStatus::Completed);
    assert!(laboratory
        .generate_report(&technician, lab_test.id)
        .await
        .is_ok());

    let bill = billing
        .create_bill(
            &receptionist,
            patient.id,
            vec![
                NewBillItem {
                    item_type: BillItemType::Consultation,
                    reference_id: Some(appointment.id),
                    description: "Consultation".to_string(),
                    quantity: 1,
                    unit_price: 150.0,
                },
                NewBillItem {
                    item_type: BillItemType::Medication,
                    reference_id: Some(amoxicillin.id),
                    description: "Amoxicillin 500mg".to_string(),
                    quantity: 14,
                    unit_price: 2.5,
                },
                NewBillItem {
                    item_type: BillItemType::LabTest,
                    reference_id: Some(lab_test.id),
                    description: "Throat culture".to_string(),
                    quantity: 1,
                    unit_price: 40.0,
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(bill.total_amount, 225.0);

    let paid = billing
        .mark_paid(&receptionist, bill.id, "card".to_string())
        .await
        .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
}

async fn run_dispense_case(lines: Vec<(i32, i32)>) {
    let db = Database::in_memory();
    let pharmacy = PharmacyService::new(db.clone());
    let patient = db
        .storage
        .insert_patient(models::medical::Patient {
            id: 0,
            first_name: "Prop".to_string(),
            last_name: "Test".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            gender: "other".to_string(),
            blood_group: None,
            phone: "555-0000".to_string(),
            email: None,
            address: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let mut rx_lines = Vec::new();
    let mut med_ids = Vec::new();
    for (index, (stock, quantity)) in lines.iter().enumerate() {
        let med = db
            .storage
            .insert_medication(medication(&format!("med-{}", index), *stock))
            .await
            .unwrap();
        med_ids.push(med.id);
        rx_lines.push((med.id, *quantity));
    }
    let rx = db
        .storage
        .insert_prescription(prescription(patient.id, 1, rx_lines))
        .await
        .unwrap();

    let expect_success = lines.iter().all(|(stock, quantity)| stock >= quantity);
    let result = pharmacy.dispense(&ctx(5, Role::Pharmacist), rx.id, None).await;

    let stored_rx = db.storage.get_prescription(rx.id).await.unwrap().unwrap();
    for (index, (stock, quantity)) in lines.iter().enumerate() {
        let stored = db
            .storage
            .get_medication(med_ids[index])
            .await
            .unwrap()
            .unwrap();
        if expect_success {
            assert_eq!(stored.stock_quantity, stock - quantity);
        } else {
            // No partial effect: every stock is exactly as seeded.
            assert_eq!(stored.stock_quantity, *stock);
        }
        assert!(stored.stock_quantity >= 0);
    }
    if expect_success {
        assert!(result.is_ok());
        assert_eq!(stored_rx.status, PrescriptionStatus::Dispensed);
    } else {
        assert!(matches!(
            result.unwrap_err(),
            HospitalError::InsufficientStock { .. }
        ));
        assert_eq!(stored_rx.status, PrescriptionStatus::Pending);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Dispensing either decrements every line exactly or changes nothing,
    /// across random stock/quantity mixes including exact-boundary and
    /// deficit lines.
    #[test]
    fn prop_dispense_is_all_or_nothing(
        lines in proptest::collection::vec((0i32..=20, 1i32..=20), 1..=6)
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(run_dispense_case(lines));
    }

    /// Stock stays non-negative under arbitrary add/subtract/dispense mixes.
    #[test]
    fn prop_stock_is_never_negative(
        ops in proptest::collection::vec((0u8..3, 1i32..=25), 1..=24),
        initial in 0i32..=30,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let db = Database::in_memory();
            let pharmacy = PharmacyService::new(db.clone());
            let pharmacist = ctx(5, Role::Pharmacist);
            let patient = db
                .storage
                .insert_patient(models::medical::Patient {
                    id: 0,
                    first_name: "Prop".to_string(),
                    last_name: "Test".to_string(),
                    date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                    gender: "other".to_string(),
                    blood_group: None,
                    phone: "555-0000".to_string(),
                    email: None,
                    address: None,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
            let med = db
                .storage
                .insert_medication(medication("prop-med", initial))
                .await
                .unwrap();

            for (kind, quantity) in ops {
                match kind {
                    0 => {
                        let _ = pharmacy
                            .adjust_stock(&pharmacist, med.id, StockOperation::Add, quantity)
                            .await;
                    }
                    1 => {
                        let _ = pharmacy
                            .adjust_stock(&pharmacist, med.id, StockOperation::Subtract, quantity)
                            .await;
                    }
                    _ => {
                        let rx = db
                            .storage
                            .insert_prescription(prescription(
                                patient.id,
                                1,
                                vec![(med.id, quantity)],
                            ))
                            .await
                            .unwrap();
                        let _ = pharmacy.dispense(&pharmacist, rx.id, None).await;
                    }
                }
                let stock = db
                    .storage
                    .get_medication(med.id)
                    .await
                    .unwrap()
                    .unwrap()
                    .stock_quantity;
                assert!(stock >= 0, "stock went negative: {}", stock);
            }
        });
    }
}
