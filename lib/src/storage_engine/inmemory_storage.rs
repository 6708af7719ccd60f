// lib/src/storage_engine/inmemory_storage.rs
use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex as TokioMutex;

use models::medical::{
    Appointment, Bill, LabTest, LabTestStatus, Medication, Patient, Prescription,
    PrescriptionStatus, User,
};
use models::roles::Role;
use models::{HospitalError, HospitalResult};

use crate::storage_engine::storage_engine::{
    CommitOutcome, HospitalStorageEngine, Precondition, RecordKind, WriteBatch, WriteOp,
};

#[derive(Debug, Default)]
struct IdCounters {
    user: i32,
    patient: i32,
    appointment: i32,
    prescription: i32,
    medication: i32,
    lab_test: i32,
    bill: i32,
}

impl IdCounters {
    fn next(&mut self, kind: RecordKind) -> i32 {
        let counter = match kind {
            RecordKind::User => &mut self.user,
            RecordKind::Patient => &mut self.patient,
            RecordKind::Appointment => &mut self.appointment,
            RecordKind::Prescription => &mut self.prescription,
            RecordKind::Medication => &mut self.medication,
            RecordKind::LabTest => &mut self.lab_test,
            RecordKind::Bill => &mut self.bill,
        };
        *counter += 1;
        *counter
    }
}

#[derive(Debug, Default)]
struct StoreState {
    users: HashMap<i32, User>,
    patients: HashMap<i32, Patient>,
    appointments: HashMap<i32, Appointment>,
    prescriptions: HashMap<i32, Prescription>,
    medications: HashMap<i32, Medication>,
    lab_tests: HashMap<i32, LabTest>,
    bills: HashMap<i32, Bill>,
    ids: IdCounters,
}

impl StoreState {
    /// Checks one batch precondition against current state.
    fn check_precondition(&self, precondition: &Precondition) -> HospitalResult<()> {
        match precondition {
            Precondition::AppointmentInStatus { id, status } => {
                let appointment = self
                    .appointments
                    .get(id)
                    .ok_or_else(|| HospitalError::not_found("appointment", *id))?;
                if appointment.status != *status {
                    return Err(HospitalError::InvalidState(format!(
                        "appointment {} is {}",
                        id, appointment.status
                    )));
                }
            }
            Precondition::PrescriptionInStatus { id, status } => {
                let prescription = self
                    .prescriptions
                    .get(id)
                    .ok_or_else(|| HospitalError::not_found("prescription", *id))?;
                if prescription.status != *status {
                    return Err(HospitalError::InvalidState(format!(
                        "prescription {} is {}",
                        id, prescription.status
                    )));
                }
            }
            Precondition::LabTestAcceptsResults { id } => {
                let test = self
                    .lab_tests
                    .get(id)
                    .ok_or_else(|| HospitalError::not_found("lab test", *id))?;
                if !test.status.accepts_results() {
                    return Err(HospitalError::InvalidState(format!(
                        "lab test {} is {}",
                        id, test.status
                    )));
                }
            }
            Precondition::BillInStatus { id, status } => {
                let bill = self
                    .bills
                    .get(id)
                    .ok_or_else(|| HospitalError::not_found("bill", *id))?;
                if bill.payment_status != *status {
                    return Err(HospitalError::InvalidState(format!(
                        "bill {} is {}",
                        id, bill.payment_status
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validates every write without mutating anything. Returns the resolved
    /// stock level per adjusted medication so the apply phase cannot fail.
    fn validate_ops(&self, ops: &[WriteOp]) -> HospitalResult<HashMap<i32, i32>> {
        let mut stock_levels: HashMap<i32, i32> = HashMap::new();
        for op in ops {
            match op {
                WriteOp::PutAppointment(a) if !self.appointments.contains_key(&a.id) => {
                    return Err(HospitalError::not_found("appointment", a.id));
                }
                WriteOp::PutPrescription(p) if !self.prescriptions.contains_key(&p.id) => {
                    return Err(HospitalError::not_found("prescription", p.id));
                }
                WriteOp::PutLabTest(t) if !self.lab_tests.contains_key(&t.id) => {
                    return Err(HospitalError::not_found("lab test", t.id));
                }
                WriteOp::PutBill(b) if !self.bills.contains_key(&b.id) => {
                    return Err(HospitalError::not_found("bill", b.id));
                }
                WriteOp::PutMedication(m) if !self.medications.contains_key(&m.id) => {
                    return Err(HospitalError::not_found("medication", m.id));
                }
                WriteOp::AdjustMedicationStock {
                    medication_id,
                    delta,
                } => {
                    let medication = self
                        .medications
                        .get(medication_id)
                        .ok_or_else(|| HospitalError::not_found("medication", *medication_id))?;
                    let current = *stock_levels
                        .get(medication_id)
                        .unwrap_or(&medication.stock_quantity);
                    let next = current + delta;
                    if next < 0 {
                        return Err(HospitalError::InsufficientStock {
                            medication: medication.name.clone(),
                            requested: -delta,
                            available: current,
                        });
                    }
                    stock_levels.insert(*medication_id, next);
                }
                _ => {}
            }
        }
        Ok(stock_levels)
    }
}

/// The shipped storage engine: every table behind one mutex, so each CRUD
/// call and each batch commit is serialized and atomic.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    state: TokioMutex<StoreState>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage::default()
    }
}

fn sorted_by_id<T: Clone>(map: &HashMap<i32, T>) -> Vec<T> {
    let mut keys: Vec<&i32> = map.keys().collect();
    keys.sort();
    keys.into_iter().map(|k| map[k].clone()).collect()
}

#[async_trait]
impl HospitalStorageEngine for InMemoryStorage {
    // === USERS ===

    async fn insert_user(&self, mut user: User) -> HospitalResult<User> {
        let mut state = self.state.lock().await;
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(HospitalError::AlreadyExists(format!(
                "a user with email {}",
                user.email
            )));
        }
        user.id = state.ids.next(RecordKind::User);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i32) -> HospitalResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> HospitalResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_user(&self, user: User) -> HospitalResult<()> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&user.id) {
            return Err(HospitalError::not_found("user", user.id));
        }
        if state
            .users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(HospitalError::AlreadyExists(format!(
                "a user with email {}",
                user.email
            )));
        }
        state.users.insert(user.id, user);
        Ok(())
    }

    async fn delete_user(&self, id: i32) -> HospitalResult<()> {
        let mut state = self.state.lock().await;
        state
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| HospitalError::not_found("user", id))
    }

    async fn list_users(&self) -> HospitalResult<Vec<User>> {
        let state = self.state.lock().await;
        Ok(sorted_by_id(&state.users))
    }

    async fn users_by_role(&self, role: Role) -> HospitalResult<Vec<User>> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    // === PATIENTS ===

    async fn insert_patient(&self, mut patient: Patient) -> HospitalResult<Patient> {
        let mut state = self.state.lock().await;
        patient.id = state.ids.next(RecordKind::Patient);
        state.patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn get_patient(&self, id: i32) -> HospitalResult<Option<Patient>> {
        let state = self.state.lock().await;
        Ok(state.patients.get(&id).cloned())
    }

    async fn update_patient(&self, patient: Patient) -> HospitalResult<()> {
        let mut state = self.state.lock().await;
        if !state.patients.contains_key(&patient.id) {
            return Err(HospitalError::not_found("patient", patient.id));
        }
        state.patients.insert(patient.id, patient);
        Ok(())
    }

    async fn delete_patient(&self, id: i32) -> HospitalResult<()> {
        let mut state = self.state.lock().await;
        if state.patients.remove(&id).is_none() {
            return Err(HospitalError::not_found("patient", id));
        }
        // Cascade to everything the patient owns.
        state.appointments.retain(|_, a| a.patient_id != id);
        state.prescriptions.retain(|_, p| p.patient_id != id);
        state.lab_tests.retain(|_, t| t.patient_id != id);
        debug!("deleted patient {} with owned records", id);
        Ok(())
    }

    async fn list_patients(&self) -> HospitalResult<Vec<Patient>> {
        let state = self.state.lock().await;
        Ok(sorted_by_id(&state.patients))
    }

    async fn search_patients(&self, query: &str) -> HospitalResult<Vec<Patient>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let state = self.state.lock().await;
        let mut matches: Vec<Patient> = state
            .patients
            .values()
            .filter(|p| {
                p.first_name.to_lowercase().contains(&needle)
                    || p.last_name.to_lowercase().contains(&needle)
                    || p.phone.contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by_key(|p| p.id);
        Ok(matches)
    }

    // === APPOINTMENTS ===

    async fn insert_appointment(
        &self,
        mut appointment: Appointment,
    ) -> HospitalResult<Appointment> {
        let mut state = self.state.lock().await;
        if !state.patients.contains_key(&appointment.patient_id) {
            return Err(HospitalError::not_found("patient", appointment.patient_id));
        }
        appointment.id = state.ids.next(RecordKind::Appointment);
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get_appointment(&self, id: i32) -> HospitalResult<Option<Appointment>> {
        let state = self.state.lock().await;
        Ok(state.appointments.get(&id).cloned())
    }

    async fn update_appointment(&self, appointment: Appointment) -> HospitalResult<()> {
        let mut state = self.state.lock().await;
        if !state.appointments.contains_key(&appointment.id) {
            return Err(HospitalError::not_found("appointment", appointment.id));
        }
        state.appointments.insert(appointment.id, appointment);
        Ok(())
    }

    async fn list_appointments(&self) -> HospitalResult<Vec<Appointment>> {
        let state = self.state.lock().await;
        Ok(sorted_by_id(&state.appointments))
    }

    async fn appointments_for_doctor(&self, doctor_id: i32) -> HospitalResult<Vec<Appointment>> {
        let state = self.state.lock().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.doctor_id == doctor_id)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.id);
        Ok(appointments)
    }

    async fn appointments_for_patient(&self, patient_id: i32) -> HospitalResult<Vec<Appointment>> {
        let state = self.state.lock().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.id);
        Ok(appointments)
    }

    // === PRESCRIPTIONS ===

    async fn insert_prescription(
        &self,
        mut prescription: Prescription,
    ) -> HospitalResult<Prescription> {
        let mut state = self.state.lock().await;
        if !state.patients.contains_key(&prescription.patient_id) {
            return Err(HospitalError::not_found("patient", prescription.patient_id));
        }
        prescription.id = state.ids.next(RecordKind::Prescription);
        state
            .prescriptions
            .insert(prescription.id, prescription.clone());
        Ok(prescription)
    }

    async fn get_prescription(&self, id: i32) -> HospitalResult<Option<Prescription>> {
        let state = self.state.lock().await;
        Ok(state.prescriptions.get(&id).cloned())
    }

    async fn update_prescription(&self, prescription: Prescription) -> HospitalResult<()> {
        let mut state = self.state.lock().await;
        if !state.prescriptions.contains_key(&prescription.id) {
            return Err(HospitalError::not_found("prescription", prescription.id));
        }
        state.prescriptions.insert(prescription.id, prescription);
        Ok(())
    }

    async fn list_prescriptions(&self) -> HospitalResult<Vec<Prescription>> {
        let state = self.state.lock().await;
        Ok(sorted_by_id(&state.prescriptions))
    }

    async fn prescriptions_by_status(
        &self,
        status: PrescriptionStatus,
    ) -> HospitalResult<Vec<Prescription>> {
        let state = self.state.lock().await;
        let mut prescriptions: Vec<Prescription> = state
            .prescriptions
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect();
        prescriptions.sort_by_key(|p| p.id);
        Ok(prescriptions)
    }

    async fn prescriptions_for_patient(
        &self,
        patient_id: i32,
    ) -> HospitalResult<Vec<Prescription>> {
        let state = self.state.lock().await;
        let mut prescriptions: Vec<Prescription> = state
            .prescriptions
            .values()
            .filter(|p| p.patient_id == patient_id)
            .cloned()
            .collect();
        prescriptions.sort_by_key(|p| p.id);
        Ok(prescriptions)
    }

    async fn prescriptions_for_doctor(&self, doctor_id: i32) -> HospitalResult<Vec<Prescription>> {
        let state = self.state.lock().await;
        let mut prescriptions: Vec<Prescription> = state
            .prescriptions
            .values()
            .filter(|p| p.doctor_id == doctor_id)
            .cloned()
            .collect();
        prescriptions.sort_by_key(|p| p.id);
        Ok(prescriptions)
    }

    // === MEDICATIONS ===

    async fn insert_medication(&self, mut medication: Medication) -> HospitalResult<Medication> {
        let mut state = self.state.lock().await;
        medication.id = state.ids.next(RecordKind::Medication);
        state.medications.insert(medication.id, medication.clone());
        Ok(medication)
    }

    async fn get_medication(&self, id: i32) -> HospitalResult<Option<Medication>> {
        let state = self.state.lock().await;
        Ok(state.medications.get(&id).cloned())
    }

    async fn find_medication_by_name(&self, name: &str) -> HospitalResult<Option<Medication>> {
        let state = self.state.lock().await;
        Ok(state
            .medications
            .values()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn update_medication(&self, medication: Medication) -> HospitalResult<()> {
        let mut state = self.state.lock().await;
        if !state.medications.contains_key(&medication.id) {
            return Err(HospitalError::not_found("medication", medication.id));
        }
        state.medications.insert(medication.id, medication);
        Ok(())
    }

    async fn delete_medication(&self, id: i32) -> HospitalResult<()> {
        let mut state = self.state.lock().await;
        state
            .medications
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| HospitalError::not_found("medication", id))
    }

    async fn list_medications(&self) -> HospitalResult<Vec<Medication>> {
        let state = self.state.lock().await;
        Ok(sorted_by_id(&state.medications))
    }

    async fn low_stock_medications(&self) -> HospitalResult<Vec<Medication>> {
        let state = self.state.lock().await;
        let mut medications: Vec<Medication> = state
            .medications
            .values()
            .filter(|m| m.is_low_stock())
            .cloned()
            .collect();
        medications.sort_by_key(|m| m.id);
        Ok(medications)
    }

    // === LAB TESTS ===

    async fn insert_lab_test(&self, mut test: LabTest) -> HospitalResult<LabTest> {
        let mut state = self.state.lock().await;
        if !state.patients.contains_key(&test.patient_id) {
            return Err(HospitalError::not_found("patient", test.patient_id));
        }
        test.id = state.ids.next(RecordKind::LabTest);
        state.lab_tests.insert(test.id, test.clone());
        Ok(test)
    }

    async fn get_lab_test(&self, id: i32) -> HospitalResult<Option<LabTest>> {
        let state = self.state.lock().await;
        Ok(state.lab_tests.get(&id).cloned())
    }

    async fn update_lab_test(&self, test: LabTest) -> HospitalResult<()> {
        let mut state = self.state.lock().await;
        if !state.lab_tests.contains_key(&test.id) {
            return Err(HospitalError::not_found("lab test", test.id));
        }
        state.lab_tests.insert(test.id, test);
        Ok(())
    }

    async fn list_lab_tests(&self) -> HospitalResult<Vec<LabTest>> {
        let state = self.state.lock().await;
        Ok(sorted_by_id(&state.lab_tests))
    }

    async fn lab_tests_by_status(&self, status: LabTestStatus) -> HospitalResult<Vec<LabTest>> {
        let state = self.state.lock().await;
        let mut tests: Vec<LabTest> = state
            .lab_tests
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        tests.sort_by_key(|t| t.id);
        Ok(tests)
    }

    async fn lab_tests_for_patient(&self, patient_id: i32) -> HospitalResult<Vec<LabTest>> {
        let state = self.state.lock().await;
        let mut tests: Vec<LabTest> = state
            .lab_tests
            .values()
            .filter(|t| t.patient_id == patient_id)
            .cloned()
            .collect();
        tests.sort_by_key(|t| t.id);
        Ok(tests)
    }

    // === BILLS ===

    async fn insert_bill(&self, mut bill: Bill) -> HospitalResult<Bill> {
        let mut state = self.state.lock().await;
        if !state.patients.contains_key(&bill.patient_id) {
            return Err(HospitalError::not_found("patient", bill.patient_id));
        }
        bill.id = state.ids.next(RecordKind::Bill);
        state.bills.insert(bill.id, bill.clone());
        Ok(bill)
    }

    async fn get_bill(&self, id: i32) -> HospitalResult<Option<Bill>> {
        let state = self.state.lock().await;
        Ok(state.bills.get(&id).cloned())
    }

    async fn update_bill(&self, bill: Bill) -> HospitalResult<()> {
        let mut state = self.state.lock().await;
        if !state.bills.contains_key(&bill.id) {
            return Err(HospitalError::not_found("bill", bill.id));
        }
        state.bills.insert(bill.id, bill);
        Ok(())
    }

    async fn list_bills(&self) -> HospitalResult<Vec<Bill>> {
        let state = self.state.lock().await;
        Ok(sorted_by_id(&state.bills))
    }

    async fn bills_for_patient(&self, patient_id: i32) -> HospitalResult<Vec<Bill>> {
        let state = self.state.lock().await;
        let mut bills: Vec<Bill> = state
            .bills
            .values()
            .filter(|b| b.patient_id == patient_id)
            .cloned()
            .collect();
        bills.sort_by_key(|b| b.id);
        Ok(bills)
    }

    // === TRANSACTIONAL BOUNDARY ===

    async fn apply_batch(&self, batch: WriteBatch) -> HospitalResult<CommitOutcome> {
        let mut state = self.state.lock().await;

        // Validate everything first; nothing below this block may fail.
        for precondition in &batch.preconditions {
            state.check_precondition(precondition)?;
        }
        let stock_levels = state.validate_ops(&batch.ops)?;

        let mut outcome = CommitOutcome::default();
        for op in batch.ops {
            match op {
                WriteOp::PutAppointment(a) => {
                    state.appointments.insert(a.id, a);
                }
                WriteOp::PutPrescription(p) => {
                    state.prescriptions.insert(p.id, p);
                }
                WriteOp::PutLabTest(t) => {
                    state.lab_tests.insert(t.id, t);
                }
                WriteOp::PutBill(b) => {
                    state.bills.insert(b.id, b);
                }
                WriteOp::PutMedication(m) => {
                    state.medications.insert(m.id, m);
                }
                WriteOp::InsertPrescription(mut p) => {
                    p.id = state.ids.next(RecordKind::Prescription);
                    outcome.created.push((RecordKind::Prescription, p.id));
                    state.prescriptions.insert(p.id, p);
                }
                WriteOp::InsertLabTest(mut t) => {
                    t.id = state.ids.next(RecordKind::LabTest);
                    outcome.created.push((RecordKind::LabTest, t.id));
                    state.lab_tests.insert(t.id, t);
                }
                WriteOp::InsertBill(mut b) => {
                    b.id = state.ids.next(RecordKind::Bill);
                    outcome.created.push((RecordKind::Bill, b.id));
                    state.bills.insert(b.id, b);
                }
                WriteOp::AdjustMedicationStock { medication_id, .. } => {
                    // validate_ops resolved the final level per medication.
                    let stock = stock_levels[&medication_id];
                    if let Some(medication) = state.medications.get_mut(&medication_id) {
                        medication.stock_quantity = stock;
                    }
                }
            }
        }
        Ok(outcome)
    }
}
