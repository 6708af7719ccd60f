// lib/src/storage_engine/storage_engine.rs
//! Persistence boundary for the hospital domain.
//!
//! Single-row reads and writes go through the per-entity CRUD methods. The
//! two multi-row operations (consultation completion, dispensing) go through
//! [`HospitalStorageEngine::apply_batch`], whose contract is all-or-nothing:
//! every precondition is re-checked under the engine's own lock, every write
//! is validated, and only then is anything mutated. A failed batch leaves
//! the store untouched.

use async_trait::async_trait;

use models::medical::{
    Appointment, AppointmentStatus, Bill, LabTest, LabTestStatus, Medication, Patient,
    PaymentStatus, Prescription, PrescriptionStatus, User,
};
use models::roles::Role;
use models::HospitalResult;

/// A condition the engine re-verifies atomically before committing a batch.
/// Failing a precondition maps onto the domain error taxonomy (`NotFound`,
/// `InvalidState`), never onto a generic storage error.
#[derive(Debug, Clone)]
pub enum Precondition {
    AppointmentInStatus { id: i32, status: AppointmentStatus },
    PrescriptionInStatus { id: i32, status: PrescriptionStatus },
    LabTestAcceptsResults { id: i32 },
    BillInStatus { id: i32, status: PaymentStatus },
}

/// A single write within a batch. `Put*` updates an existing row; `Insert*`
/// allocates an id. `AdjustMedicationStock` is applied relative to the stock
/// the engine sees at commit time, and the engine refuses any batch that
/// would drive a stock quantity negative.
#[derive(Debug, Clone)]
pub enum WriteOp {
    PutAppointment(Appointment),
    PutPrescription(Prescription),
    PutLabTest(LabTest),
    PutBill(Bill),
    PutMedication(Medication),
    InsertPrescription(Prescription),
    InsertLabTest(LabTest),
    InsertBill(Bill),
    AdjustMedicationStock { medication_id: i32, delta: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    User,
    Patient,
    Appointment,
    Prescription,
    Medication,
    LabTest,
    Bill,
}

/// Preconditions plus writes, committed as one unit.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub preconditions: Vec<Precondition>,
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch::default()
    }

    pub fn require(mut self, precondition: Precondition) -> Self {
        self.preconditions.push(precondition);
        self
    }

    pub fn push(mut self, op: WriteOp) -> Self {
        self.ops.push(op);
        self
    }
}

/// Ids allocated for the batch's `Insert*` ops, in op order.
#[derive(Debug, Clone, Default)]
pub struct CommitOutcome {
    pub created: Vec<(RecordKind, i32)>,
}

impl CommitOutcome {
    pub fn created_ids(&self, kind: RecordKind) -> Vec<i32> {
        self.created
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, id)| *id)
            .collect()
    }
}

#[async_trait]
pub trait HospitalStorageEngine: std::fmt::Debug + Send + Sync {
    // === USERS ===
    async fn insert_user(&self, user: User) -> HospitalResult<User>;
    async fn get_user(&self, id: i32) -> HospitalResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> HospitalResult<Option<User>>;
    async fn update_user(&self, user: User) -> HospitalResult<()>;
    async fn delete_user(&self, id: i32) -> HospitalResult<()>;
    async fn list_users(&self) -> HospitalResult<Vec<User>>;
    async fn users_by_role(&self, role: Role) -> HospitalResult<Vec<User>>;

    // === PATIENTS ===
    async fn insert_patient(&self, patient: Patient) -> HospitalResult<Patient>;
    async fn get_patient(&self, id: i32) -> HospitalResult<Option<Patient>>;
    async fn update_patient(&self, patient: Patient) -> HospitalResult<()>;
    /// Cascades to the patient's appointments, prescriptions and lab tests.
    async fn delete_patient(&self, id: i32) -> HospitalResult<()>;
    async fn list_patients(&self) -> HospitalResult<Vec<Patient>>;
    async fn search_patients(&self, query: &str) -> HospitalResult<Vec<Patient>>;

    // === APPOINTMENTS ===
    async fn insert_appointment(&self, appointment: Appointment) -> HospitalResult<Appointment>;
    async fn get_appointment(&self, id: i32) -> HospitalResult<Option<Appointment>>;
    async fn update_appointment(&self, appointment: Appointment) -> HospitalResult<()>;
    async fn list_appointments(&self) -> HospitalResult<Vec<Appointment>>;
    async fn appointments_for_doctor(&self, doctor_id: i32) -> HospitalResult<Vec<Appointment>>;
    async fn appointments_for_patient(&self, patient_id: i32) -> HospitalResult<Vec<Appointment>>;

    // === PRESCRIPTIONS ===
    async fn insert_prescription(&self, prescription: Prescription)
        -> HospitalResult<Prescription>;
    async fn get_prescription(&self, id: i32) -> HospitalResult<Option<Prescription>>;
    async fn update_prescription(&self, prescription: Prescription) -> HospitalResult<()>;
    async fn list_prescriptions(&self) -> HospitalResult<Vec<Prescription>>;
    async fn prescriptions_by_status(
        &self,
        status: PrescriptionStatus,
    ) -> HospitalResult<Vec<Prescription>>;
    async fn prescriptions_for_patient(&self, patient_id: i32)
        -> HospitalResult<Vec<Prescription>>;
    async fn prescriptions_for_doctor(&self, doctor_id: i32) -> HospitalResult<Vec<Prescription>>;

    // === MEDICATIONS ===
    async fn insert_medication(&self, medication: Medication) -> HospitalResult<Medication>;
    async fn get_medication(&self, id: i32) -> HospitalResult<Option<Medication>>;
    async fn find_medication_by_name(&self, name: &str) -> HospitalResult<Option<Medication>>;
    async fn update_medication(&self, medication: Medication) -> HospitalResult<()>;
    async fn delete_medication(&self, id: i32) -> HospitalResult<()>;
    async fn list_medications(&self) -> HospitalResult<Vec<Medication>>;
    async fn low_stock_medications(&self) -> HospitalResult<Vec<Medication>>;

    // === LAB TESTS ===
    async fn insert_lab_test(&self, test: LabTest) -> HospitalResult<LabTest>;
    async fn get_lab_test(&self, id: i32) -> HospitalResult<Option<LabTest>>;
    async fn update_lab_test(&self, test: LabTest) -> HospitalResult<()>;
    async fn list_lab_tests(&self) -> HospitalResult<Vec<LabTest>>;
    async fn lab_tests_by_status(&self, status: LabTestStatus) -> HospitalResult<Vec<LabTest>>;
    async fn lab_tests_for_patient(&self, patient_id: i32) -> HospitalResult<Vec<LabTest>>;

    // === BILLS ===
    async fn insert_bill(&self, bill: Bill) -> HospitalResult<Bill>;
    async fn get_bill(&self, id: i32) -> HospitalResult<Option<Bill>>;
    async fn update_bill(&self, bill: Bill) -> HospitalResult<()>;
    async fn list_bills(&self) -> HospitalResult<Vec<Bill>>;
    async fn bills_for_patient(&self, patient_id: i32) -> HospitalResult<Vec<Bill>>;

    // === TRANSACTIONAL BOUNDARY ===
    /// Validate every precondition and write, then apply all writes, as one
    /// atomic unit. On any failure nothing is mutated.
    async fn apply_batch(&self, batch: WriteBatch) -> HospitalResult<CommitOutcome>;
}
