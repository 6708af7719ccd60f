// lib/src/services/consultation.rs
//! The doctor's consultation workflow. Completing an appointment, creating
//! the prescription with its lines, and creating the requested lab tests is
//! one atomic commit: either all of it lands or none of it does.

use chrono::Utc;
use log::info;

use models::medical::{
    Appointment, AppointmentStatus, LabTest, LabTestStatus, Prescription, PrescriptionMedication,
    PrescriptionStatus,
};
use models::roles::Capability;
use models::{HospitalError, HospitalResult, ValidationError};

use crate::access::AuthContext;
use crate::database::Database;
use crate::storage_engine::{Precondition, RecordKind, WriteBatch, WriteOp};

/// One medication line as submitted by the doctor.
#[derive(Debug, Clone)]
pub struct MedicationLine {
    pub medication_id: i32,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct LabRequest {
    pub test_type: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConsultationOutcome {
    pub diagnosis: String,
    pub notes: Option<String>,
    pub medications: Vec<MedicationLine>,
    pub lab_requests: Vec<LabRequest>,
}

/// Everything the consultation produced, with storage-assigned ids.
#[derive(Debug, Clone)]
pub struct ConsultationRecord {
    pub appointment: Appointment,
    pub prescription: Option<Prescription>,
    pub lab_tests: Vec<LabTest>,
}

#[derive(Clone, Debug)]
pub struct ConsultationService {
    db: Database,
}

impl ConsultationService {
    pub fn new(db: Database) -> Self {
        ConsultationService { db }
    }

    /// Completes a scheduled appointment. Only the assigned doctor may do
    /// this, and only once: a completed or cancelled appointment is terminal.
    pub async fn complete_consultation(
        &self,
        ctx: &AuthContext,
        appointment_id: i32,
        outcome: ConsultationOutcome,
    ) -> HospitalResult<ConsultationRecord> {
        ctx.require(Capability::ConductConsultations)?;
        let mut appointment = self
            .db
            .storage
            .get_appointment(appointment_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("appointment", appointment_id))?;
        if appointment.doctor_id != ctx.user_id {
            return Err(HospitalError::PermissionDenied(
                "only the assigned doctor may complete this appointment".to_string(),
            ));
        }
        if !appointment.is_scheduled() {
            return Err(HospitalError::InvalidState(format!(
                "appointment {} is {}",
                appointment_id, appointment.status
            )));
        }
        if outcome.diagnosis.trim().is_empty() {
            return Err(ValidationError::Required("diagnosis".to_string()).into());
        }
        self.validate_medication_lines(&outcome.medications).await?;
        for request in &outcome.lab_requests {
            if request.test_type.trim().is_empty() {
                return Err(ValidationError::Required("test_type".to_string()).into());
            }
        }

        let now = Utc::now();
        appointment.status = AppointmentStatus::Completed;
        appointment.diagnosis = Some(outcome.diagnosis.clone());
        if outcome.notes.is_some() {
            appointment.notes = outcome.notes.clone();
        }

        let mut batch = WriteBatch::new()
            .require(Precondition::AppointmentInStatus {
                id: appointment_id,
                status: AppointmentStatus::Scheduled,
            })
            .push(WriteOp::PutAppointment(appointment.clone()));

        // The prescription and lab tests inherit the appointment's patient
        // and doctor.
        let mut prescription = None;
        if !outcome.medications.is_empty() {
            let record = Prescription {
                id: 0,
                patient_id: appointment.patient_id,
                doctor_id: appointment.doctor_id,
                diagnosis: outcome.diagnosis.clone(),
                notes: outcome.notes.clone(),
                prescription_date: now,
                status: PrescriptionStatus::Pending,
                medications: outcome
                    .medications
                    .iter()
                    .map(|line| PrescriptionMedication {
                        medication_id: line.medication_id,
                        dosage: line.dosage.clone(),
                        frequency: line.frequency.clone(),
                        duration: line.duration.clone(),
                        quantity: line.quantity,
                    })
                    .collect(),
                dispensed_by: None,
                dispensed_at: None,
                dispensing_notes: None,
            };
            batch = batch.push(WriteOp::InsertPrescription(record.clone()));
            prescription = Some(record);
        }

        let mut lab_tests: Vec<LabTest> = Vec::with_capacity(outcome.lab_requests.len());
        for request in &outcome.lab_requests {
            let test = LabTest {
                id: 0,
                patient_id: appointment.patient_id,
                doctor_id: appointment.doctor_id,
                test_type: request.test_type.clone(),
                status: LabTestStatus::Pending,
                notes: request.notes.clone(),
                results: None,
                normal_range: None,
                remarks: None,
                requested_by: Some(ctx.user_id),
                requested_date: now,
                completed_by: None,
                completed_date: None,
            };
            batch = batch.push(WriteOp::InsertLabTest(test.clone()));
            lab_tests.push(test);
        }

        let commit = self.db.storage.apply_batch(batch).await?;
        if let Some(ref mut record) = prescription {
            record.id = commit
                .created_ids(RecordKind::Prescription)
                .first()
                .copied()
                .ok_or_else(|| {
                    HospitalError::Internal("commit reported no prescription id".to_string())
                })?;
        }
        for (test, id) in lab_tests
            .iter_mut()
            .zip(commit.created_ids(RecordKind::LabTest))
        {
            test.id = id;
        }

        info!(
            "appointment {} completed by doctor {} ({} prescription, {} lab tests)",
            appointment_id,
            ctx.user_id,
            if prescription.is_some() { 1 } else { 0 },
            lab_tests.len()
        );
        Ok(ConsultationRecord {
            appointment,
            prescription,
            lab_tests,
        })
    }

    async fn validate_medication_lines(&self, lines: &[MedicationLine]) -> HospitalResult<()> {
        for line in lines {
            if line.quantity <= 0 {
                return Err(ValidationError::NonPositiveQuantity("quantity".to_string()).into());
            }
            for (field, value) in [
                ("dosage", &line.dosage),
                ("frequency", &line.frequency),
                ("duration", &line.duration),
            ] {
                if value.trim().is_empty() {
                    return Err(ValidationError::Required(field.to_string()).into());
                }
            }
            if self
                .db
                .storage
                .get_medication(line.medication_id)
                .await?
                .is_none()
            {
                return Err(HospitalError::not_found("medication", line.medication_id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::roles::Role;

    use crate::services::test_support::{ctx, new_medication, new_patient, scheduled_appointment};

    async fn setup() -> (Database, ConsultationService, i32, i32) {
        let db = Database::in_memory();
        let service = ConsultationService::new(db.clone());
        let patient = db.storage.insert_patient(new_patient("Jane", "Doe")).await.unwrap();
        let appointment = db
            .storage
            .insert_appointment(scheduled_appointment(patient.id, 42))
            .await
            .unwrap();
        (db, service, patient.id, appointment.id)
    }

    fn med_line(medication_id: i32, quantity: i32) -> MedicationLine {
        MedicationLine {
            medication_id,
            dosage: "500mg".to_string(),
            frequency: "twice daily".to_string(),
            duration: "7 days".to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn should_complete_and_create_prescription_and_lab_tests() {
        let (db, service, patient_id, appointment_id) = setup().await;
        let amoxicillin = db
            .storage
            .insert_medication(new_medication("Amoxicillin", 2.5, 50))
            .await
            .unwrap();

        let record = service
            .complete_consultation(
                &ctx(42, Role::Doctor),
                appointment_id,
                ConsultationOutcome {
                    diagnosis: "strep throat".to_string(),
                    notes: Some("follow up in two weeks".to_string()),
                    medications: vec![med_line(amoxicillin.id, 14)],
                    lab_requests: vec![LabRequest {
                        test_type: "Throat culture".to_string(),
                        notes: None,
                    }],
                },
            )
            .await
            .unwrap();

        assert_eq!(record.appointment.status, AppointmentStatus::Completed);
        assert_eq!(record.appointment.diagnosis.as_deref(), Some("strep throat"));

        let prescription = record.prescription.unwrap();
        assert!(prescription.id > 0);
        assert_eq!(prescription.patient_id, patient_id);
        assert_eq!(prescription.doctor_id, 42);
        assert_eq!(prescription.status, PrescriptionStatus::Pending);
        assert_eq!(prescription.medications.len(), 1);

        assert_eq!(record.lab_tests.len(), 1);
        assert_eq!(record.lab_tests[0].patient_id, patient_id);
        assert_eq!(record.lab_tests[0].status, LabTestStatus::Pending);

        // Everything actually landed in storage.
        assert!(db
            .storage
            .get_prescription(prescription.id)
            .await
            .unwrap()
            .is_some());
        assert_eq!(db.storage.list_lab_tests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_forbid_a_doctor_who_is_not_assigned() {
        let (_db, service, _patient_id, appointment_id) = setup().await;
        let err = service
            .complete_consultation(
                &ctx(7, Role::Doctor),
                appointment_id,
                ConsultationOutcome {
                    diagnosis: "flu".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn should_refuse_a_second_completion() {
        let (_db, service, _patient_id, appointment_id) = setup().await;
        let doctor = ctx(42, Role::Doctor);
        let outcome = ConsultationOutcome {
            diagnosis: "flu".to_string(),
            ..Default::default()
        };
        service
            .complete_consultation(&doctor, appointment_id, outcome.clone())
            .await
            .unwrap();
        let err = service
            .complete_consultation(&doctor, appointment_id, outcome)
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidState(_)));
    }

    #[tokio::test]
    async fn should_leave_no_trace_when_a_medication_line_is_invalid() {
        let (db, service, _patient_id, appointment_id) = setup().await;
        let err = service
            .complete_consultation(
                &ctx(42, Role::Doctor),
                appointment_id,
                ConsultationOutcome {
                    diagnosis: "strep throat".to_string(),
                    medications: vec![med_line(999, 14)], // unknown medication
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::NotFound(_)));

        let appointment = db
            .storage
            .get_appointment(appointment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert!(db.storage.list_prescriptions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_require_a_diagnosis() {
        let (_db, service, _patient_id, appointment_id) = setup().await;
        let err = service
            .complete_consultation(
                &ctx(42, Role::Doctor),
                appointment_id,
                ConsultationOutcome::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn should_not_create_a_prescription_without_lines() {
        let (db, service, _patient_id, appointment_id) = setup().await;
        let record = service
            .complete_consultation(
                &ctx(42, Role::Doctor),
                appointment_id,
                ConsultationOutcome {
                    diagnosis: "flu".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(record.prescription.is_none());
        assert!(db.storage.list_prescriptions().await.unwrap().is_empty());
    }
}
