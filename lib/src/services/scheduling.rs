// lib/src/services/scheduling.rs
//! Appointment scheduling. Confirmation mail is fire-and-forget: a refused
//! send is logged and the appointment stands.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};

use models::medical::{Appointment, AppointmentStatus};
use models::roles::{Capability, Role};
use models::{HospitalError, HospitalResult};

use crate::access::AuthContext;
use crate::config::SchedulingConfig;
use crate::database::Database;
use crate::notifications::{appointment_confirmation, MailSender};
use crate::storage_engine::{Precondition, WriteBatch, WriteOp};

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: i32,
    pub doctor_id: i32,
    pub appointment_date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SchedulingService {
    db: Database,
    mailer: Arc<dyn MailSender>,
}

impl SchedulingService {
    pub fn new(db: Database, mailer: Arc<dyn MailSender>) -> Self {
        SchedulingService { db, mailer }
    }

    pub async fn schedule_appointment(
        &self,
        ctx: &AuthContext,
        new: NewAppointment,
    ) -> HospitalResult<Appointment> {
        ctx.require(Capability::ScheduleAppointments)?;
        let patient = self
            .db
            .storage
            .get_patient(new.patient_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("patient", new.patient_id))?;
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

        let appointment = Appointment {
            id: 0,
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            appointment_date: new.appointment_date,
            status: AppointmentStatus::Scheduled,
            notes: new.notes,
            diagnosis: None,
            created_at: Utc::now(),
        };
        let appointment = self.db.storage.insert_appointment(appointment).await?;

        match patient.email {
            Some(ref email) => {
                let (subject, body) = appointment_confirmation(&patient, &doctor, &appointment);
                if !self
                    .mailer
                    .send(&subject, &[email.clone()], &body, None)
                    .await
                {
                    warn!(
                        "failed to send confirmation for appointment {}",
                        appointment.id
                    );
                }
            }
            None => debug!(
                "patient {} has no email, skipping confirmation",
                patient.id
            ),
        }
        Ok(appointment)
    }

    pub async fn cancel_appointment(
        &self,
        ctx: &AuthContext,
        appointment_id: i32,
    ) -> HospitalResult<Appointment> {
        ctx.require(Capability::ScheduleAppointments)?;
        let mut appointment = self
            .db
            .storage
            .get_appointment(appointment_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("appointment", appointment_id))?;
        if !appointment.is_scheduled() {
            return Err(HospitalError::InvalidState(format!(
                "appointment {} is {}",
                appointment_id, appointment.status
            )));
        }
        appointment.status = AppointmentStatus::Cancelled;

        let batch = WriteBatch::new()
            .require(Precondition::AppointmentInStatus {
                id: appointment_id,
                status: AppointmentStatus::Scheduled,
            })
            .push(WriteOp::PutAppointment(appointment.clone()));
        self.db.storage.apply_batch(batch).await?;
        Ok(appointment)
    }

    /// A doctor may always read their own schedule; anyone else needs the
    /// scheduling capability.
    pub async fn appointments_for_doctor(
        &self,
        ctx: &AuthContext,
        doctor_id: i32,
    ) -> HospitalResult<Vec<Appointment>> {
        if ctx.user_id == doctor_id {
            ctx.require(Capability::ViewDashboard)?;
        } else {
            ctx.require(Capability::ScheduleAppointments)?;
        }
        self.db.storage.appointments_for_doctor(doctor_id).await
    }

    pub async fn appointments_for_patient(
        &self,
        ctx: &AuthContext,
        patient_id: i32,
    ) -> HospitalResult<Vec<Appointment>> {
        ctx.require(Capability::ViewPatients)?;
        self.db.storage.appointments_for_patient(patient_id).await
    }

    pub async fn list_appointments(&self, ctx: &AuthContext) -> HospitalResult<Vec<Appointment>> {
        ctx.require(Capability::ScheduleAppointments)?;
        self.db.storage.list_appointments().await
    }
}

/// Remaining bookable slots for today, stepping through the configured
/// working hours.
pub fn available_slots(config: &SchedulingConfig, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut slots = Vec::new();
    let date = now.date_naive();
    for hour in config.day_start_hour..config.day_end_hour {
        let mut minute = 0;
        while minute < 60 {
            if let Some(naive) = date.and_hms_opt(hour, minute, 0) {
                let slot = Utc.from_utc_datetime(&naive);
                if slot > now {
                    slots.push(slot);
                }
            }
            minute += config.slot_minutes.max(1);
        }
    }
    slots
}
