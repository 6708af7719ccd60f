// lib/src/services/laboratory.rs
//! Lab test lifecycle: pending → in_progress (optional) → completed, or
//! cancelled from either non-terminal state. Results only land together
//! with the transition to completed.

use std::sync::Arc;

use chrono::Utc;
use log::info;

use models::medical::{LabTest, LabTestStatus, Patient};
use models::roles::{Capability, Role};
use models::{HospitalError, HospitalResult, ValidationError};

use crate::access::AuthContext;
use crate::database::Database;
use crate::reports::DocumentRenderer;
use crate::storage_engine::{Precondition, WriteBatch, WriteOp};

#[derive(Debug, Clone)]
pub struct NewLabTest {
    pub patient_id: i32,
    pub doctor_id: i32,
    pub test_type: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub results: String,
    pub normal_range: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LaboratoryService {
    db: Database,
    renderer: Arc<dyn DocumentRenderer>,
}

impl LaboratoryService {
    pub fn new(db: Database, renderer: Arc<dyn DocumentRenderer>) -> Self {
        LaboratoryService { db, renderer }
    }

    /// Standalone test request entered at the lab desk; tests requested
    /// during a consultation go through the consultation workflow instead.
    pub async fn request_test(&self, ctx: &AuthContext, new: NewLabTest) -> HospitalResult<LabTest> {
        ctx.require(Capability::ManageLabTests)?;
        if new.test_type.trim().is_empty() {
            return Err(ValidationError::Required("test_type".to_string()).into());
        }
        let doctor = self
            .db
            .storage
            .get_user(new.doctor_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("doctor", new.doctor_id))?;
        if doctor.role != Role::Doctor {
            return Err(HospitalError::InvalidInput(format!(
                "user {} is not a doctor",
                new.doctor_id
            )));
        }

        let test = LabTest {
            id: 0,
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            test_type: new.test_type,
            status: LabTestStatus::Pending,
            notes: new.notes,
            results: None,
            normal_range: None,
            remarks: None,
            requested_by: Some(ctx.user_id),
            requested_date: Utc::now(),
            completed_by: None,
            completed_date: None,
        };
        self.db.storage.insert_lab_test(test).await
    }

    /// Optional intermediate step before results are in.
    pub async fn start_test(&self, ctx: &AuthContext, test_id: i32) -> HospitalResult<LabTest> {
        self.transition(ctx, test_id, LabTestStatus::InProgress).await
    }

    pub async fn cancel_test(&self, ctx: &AuthContext, test_id: i32) -> HospitalResult<LabTest> {
        self.transition(ctx, test_id, LabTestStatus::Cancelled).await
    }

    async fn transition(
        &self,
        ctx: &AuthContext,
        test_id: i32,
        next: LabTestStatus,
    ) -> HospitalResult<LabTest> {
        ctx.require(Capability::ManageLabTests)?;
        let mut test = self
            .db
            .storage
            .get_lab_test(test_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("lab test", test_id))?;
        if !test.status.can_transition_to(next) {
            return Err(HospitalError::InvalidState(format!(
                "lab test {} is {}",
                test_id, test.status
            )));
        }
        test.status = next;
        self.db.storage.update_lab_test(test.clone()).await?;
        Ok(test)
    }

    /// Records results and completes the test in one step, stamping
    /// completed_by/completed_date. Illegal once completed or cancelled.
    pub async fn record_result(
        &self,
        ctx: &AuthContext,
        test_id: i32,
        entry: ResultEntry,
    ) -> HospitalResult<LabTest> {
        ctx.require(Capability::ManageLabTests)?;
        let mut test = self
            .db
            .storage
            .get_lab_test(test_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("lab test", test_id))?;
        if !test.status.accepts_results() {
            return Err(HospitalError::InvalidState(format!(
                "lab test {} is {}",
                test_id, test.status
            )));
        }
        if entry.results.trim().is_empty() {
            return Err(ValidationError::Required("results".to_string()).into());
        }

        test.results = Some(entry.results);
        test.normal_range = entry.normal_range;
        test.remarks = entry.remarks;
        test.status = LabTestStatus::Completed;
        test.completed_by = Some(ctx.user_id);
        test.completed_date = Some(Utc::now());

        let batch = WriteBatch::new()
            .require(Precondition::LabTestAcceptsResults { id: test_id })
            .push(WriteOp::PutLabTest(test.clone()));
        self.db.storage.apply_batch(batch).await?;

        info!("lab test {} completed by technician {}", test_id, ctx.user_id);
        Ok(test)
    }

    /// Renders the downloadable report. Only completed tests have one.
    pub async fn generate_report(&self, ctx: &AuthContext, test_id: i32) -> HospitalResult<Vec<u8>> {
        ctx.require(Capability::ManageLabTests)?;
        let test = self
            .db
            .storage
            .get_lab_test(test_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("lab test", test_id))?;
        if test.status != LabTestStatus::Completed {
            return Err(HospitalError::InvalidState(format!(
                "cannot generate a report for a {} test",
                test.status
            )));
        }
        let patient = self.patient_of(&test).await?;
        self.renderer.render_lab_report(&test, &patient)
    }

    pub async fn tests(
        &self,
        ctx: &AuthContext,
        status: Option<LabTestStatus>,
    ) -> HospitalResult<Vec<LabTest>> {
        ctx.require(Capability::ManageLabTests)?;
        match status {
            Some(status) => self.db.storage.lab_tests_by_status(status).await,
            None => self.db.storage.list_lab_tests().await,
        }
    }

    pub async fn patient_history(
        &self,
        ctx: &AuthContext,
        patient_id: i32,
    ) -> HospitalResult<Vec<LabTest>> {
        ctx.require(Capability::ManageLabTests)?;
        if self.db.storage.get_patient(patient_id).await?.is_none() {
            return Err(HospitalError::not_found("patient", patient_id));
        }
        self.db.storage.lab_tests_for_patient(patient_id).await
    }

    async fn patient_of(&self, test: &LabTest) -> HospitalResult<Patient> {
        self.db
            .storage
            .get_patient(test.patient_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("patient", test.patient_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::roles::Role;

    use crate::reports::PlainTextRenderer;
    use crate::services::test_support::{ctx, new_patient, new_user, pending_lab_test};

    async fn setup() -> (Database, LaboratoryService, i32) {
        let db = Database::in_memory();
        let service = LaboratoryService::new(
            db.clone(),
            Arc::new(PlainTextRenderer::new("County General")),
        );
        let patient = db.storage.insert_patient(new_patient("Jane", "Doe")).await.unwrap();
        (db, service, patient.id)
    }

    fn entry(results: &str) -> ResultEntry {
        ResultEntry {
            results: results.to_string(),
            normal_range: Some("4.0-11.0".to_string()),
            remarks: None,
        }
    }

    #[tokio::test]
    async fn should_complete_a_pending_test_once() {
        // Scenario D: pending → recordResult → completed; second call fails.
        let (db, service, patient_id) = setup().await;
        let test = db
            .storage
            .insert_lab_test(pending_lab_test(patient_id, 42))
            .await
            .unwrap();
        let technician = ctx(8, Role::LabTechnician);

        let completed = service
            .record_result(&technician, test.id, entry("WBC 12.3"))
            .await
            .unwrap();
        assert_eq!(completed.status, LabTestStatus::Completed);
        assert_eq!(completed.completed_by, Some(8));
        assert!(completed.completed_date.is_some());

        let err = service
            .record_result(&technician, test.id, entry("WBC 9.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidState(_)));

        // The stored results were not overwritten by the failed call.
        let stored = db.storage.get_lab_test(test.id).await.unwrap().unwrap();
        assert_eq!(stored.results.as_deref(), Some("WBC 12.3"));
    }

    #[tokio::test]
    async fn should_walk_through_in_progress() {
        let (db, service, patient_id) = setup().await;
        let test = db
            .storage
            .insert_lab_test(pending_lab_test(patient_id, 42))
            .await
            .unwrap();
        let technician = ctx(8, Role::LabTechnician);

        let started = service.start_test(&technician, test.id).await.unwrap();
        assert_eq!(started.status, LabTestStatus::InProgress);
        let completed = service
            .record_result(&technician, test.id, entry("negative"))
            .await
            .unwrap();
        assert_eq!(completed.status, LabTestStatus::Completed);
    }

    #[tokio::test]
    async fn should_cancel_only_non_terminal_tests() {
        let (db, service, patient_id) = setup().await;
        let test = db
            .storage
            .insert_lab_test(pending_lab_test(patient_id, 42))
            .await
            .unwrap();
        let technician = ctx(8, Role::LabTechnician);

        service.cancel_test(&technician, test.id).await.unwrap();
        let err = service.cancel_test(&technician, test.id).await.unwrap_err();
        assert!(matches!(err, HospitalError::InvalidState(_)));

        // Cancelled is terminal for results as well.
        let err = service
            .record_result(&technician, test.id, entry("late"))
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidState(_)));
    }

    #[tokio::test]
    async fn should_gate_report_generation_on_completion() {
        let (db, service, patient_id) = setup().await;
        let test = db
            .storage
            .insert_lab_test(pending_lab_test(patient_id, 42))
            .await
            .unwrap();
        let technician = ctx(8, Role::LabTechnician);

        let err = service.generate_report(&technician, test.id).await.unwrap_err();
        assert!(matches!(err, HospitalError::InvalidState(_)));

        service
            .record_result(&technician, test.id, entry("negative"))
            .await
            .unwrap();
        let report = service.generate_report(&technician, test.id).await.unwrap();
        let text = String::from_utf8(report).unwrap();
        assert!(text.contains("Lab Report"));
        assert!(text.contains("negative"));
    }

    #[tokio::test]
    async fn should_request_tests_only_for_real_doctors() {
        let (db, service, patient_id) = setup().await;
        let doctor = db
            .storage
            .insert_user(new_user("doc@example.org", Role::Doctor))
            .await
            .unwrap();
        let technician = ctx(8, Role::LabTechnician);

        let test = service
            .request_test(
                &technician,
                NewLabTest {
                    patient_id,
                    doctor_id: doctor.id,
                    test_type: "Lipid panel".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(test.status, LabTestStatus::Pending);
        assert_eq!(test.requested_by, Some(8));

        let err = service
            .request_test(
                &technician,
                NewLabTest {
                    patient_id,
                    doctor_id: 999,
                    test_type: "Lipid panel".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::NotFound(_)));
    }

    #[tokio::test]
    async fn should_deny_lab_operations_to_other_roles() {
        let (db, service, patient_id) = setup().await;
        let test = db
            .storage
            .insert_lab_test(pending_lab_test(patient_id, 42))
            .await
            .unwrap();
        let err = service
            .record_result(&ctx(5, Role::Pharmacist), test.id, entry("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::PermissionDenied(_)));
    }
}
