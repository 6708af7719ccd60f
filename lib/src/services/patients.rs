// lib/src/services/patients.rs
//! Patient registry: registration, lookup, search, cascade delete.

use chrono::{NaiveDate, Utc};
use log::info;

use models::medical::Patient;
use models::roles::Capability;
use models::{HospitalError, HospitalResult, ValidationError};

use crate::access::AuthContext;
use crate::database::Database;

#[derive(Debug, Clone)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub blood_group: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PatientService {
    db: Database,
}

impl PatientService {
    pub fn new(db: Database) -> Self {
        PatientService { db }
    }

    pub async fn register_patient(
        &self,
        ctx: &AuthContext,
        new: NewPatient,
    ) -> HospitalResult<Patient> {
        ctx.require(Capability::RegisterPatients)?;
        validate_demographics(&new.first_name, &new.last_name, &new.gender, &new.phone)?;
        if let Some(ref email) = new.email {
            if !email.contains('@') {
                return Err(ValidationError::InvalidEmail(email.clone()).into());
            }
        }

        let patient = Patient {
            id: 0,
            first_name: new.first_name,
            last_name: new.last_name,
            date_of_birth: new.date_of_birth,
            gender: new.gender,
            blood_group: new.blood_group,
            phone: new.phone,
            email: new.email,
            address: new.address,
            created_at: Utc::now(),
        };
        let patient = self.db.storage.insert_patient(patient).await?;
        info!("registered patient {} ({})", patient.id, patient.full_name());
        Ok(patient)
    }

    pub async fn get_patient(&self, ctx: &AuthContext, patient_id: i32) -> HospitalResult<Patient> {
        ctx.require(Capability::ViewPatients)?;
        self.db
            .storage
            .get_patient(patient_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("patient", patient_id))
    }

    pub async fn update_patient(&self, ctx: &AuthContext, patient: Patient) -> HospitalResult<()> {
        ctx.require(Capability::RegisterPatients)?;
        validate_demographics(
            &patient.first_name,
            &patient.last_name,
            &patient.gender,
            &patient.phone,
        )?;
        self.db.storage.update_patient(patient).await
    }

    /// Deletes the patient and, with it, every appointment, prescription
    /// and lab test the patient owns. Bills are kept for the books.
    pub async fn delete_patient(&self, ctx: &AuthContext, patient_id: i32) -> HospitalResult<()> {
        ctx.require(Capability::RegisterPatients)?;
        self.db.storage.delete_patient(patient_id).await?;
        info!("deleted patient {} and owned records", patient_id);
        Ok(())
    }

    pub async fn list_patients(&self, ctx: &AuthContext) -> HospitalResult<Vec<Patient>> {
        ctx.require(Capability::ViewPatients)?;
        self.db.storage.list_patients().await
    }

    /// Substring search over name and phone, as the registration desk uses.
    pub async fn search_patients(
        &self,
        ctx: &AuthContext,
        query: &str,
    ) -> HospitalResult<Vec<Patient>> {
        ctx.require(Capability::ViewPatients)?;
        self.db.storage.search_patients(query).await
    }
}

fn validate_demographics(
    first_name: &str,
    last_name: &str,
    gender: &str,
    phone: &str,
) -> HospitalResult<()> {
    for (field, value) in [
        ("first_name", first_name),
        ("last_name", last_name),
        ("gender", gender),
        ("phone", phone),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::Required(field.to_string()).into());
        }
    }
    Ok(())
}
