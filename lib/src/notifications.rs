// lib/src/notifications.rs
//! Outbound mail boundary. Sending is fire-and-forget: a `false` return is
//! logged by callers and never escalated into a request failure.

use async_trait::async_trait;
use log::info;

use models::medical::{Appointment, Patient, User};

#[async_trait]
pub trait MailSender: std::fmt::Debug + Send + Sync {
    /// Returns true when the message was accepted for delivery.
    async fn send(
        &self,
        subject: &str,
        recipients: &[String],
        body: &str,
        html: Option<&str>,
    ) -> bool;
}

/// Default sender used when no SMTP relay is configured: logs the message
/// and reports success.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl MailSender for LogMailer {
    async fn send(
        &self,
        subject: &str,
        recipients: &[String],
        body: &str,
        _html: Option<&str>,
    ) -> bool {
        info!(
            "mail to {}: {} ({} bytes)",
            recipients.join(", "),
            subject,
            body.len()
        );
        true
    }
}

/// Composes the appointment confirmation sent to the patient after
/// scheduling. Returns `(subject, body)`.
pub fn appointment_confirmation(
    patient: &Patient,
    doctor: &User,
    appointment: &Appointment,
) -> (String, String) {
    let subject = "Appointment Confirmation".to_string();
    let body = format!(
        "Dear {},\n\n\
         Your appointment has been scheduled for {} with Dr. {} {}.\n\n\
         Please arrive 15 minutes before your scheduled time.\n\n\
         Best regards,\n\
         Hospital Management Team",
        patient.first_name,
        appointment
            .appointment_date
            .format("%B %d, %Y at %I:%M %p"),
        doctor.first_name,
        doctor.last_name,
    );
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use models::medical::AppointmentStatus;
    use models::roles::Role;

    #[test]
    fn should_compose_the_confirmation_with_date_and_doctor() {
        let patient = Patient {
            id: 1,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            date_of_birth: chrono::NaiveDate::from_ymd_opt(1984, 3, 2).unwrap(),
            gender: "female".to_string(),
            blood_group: None,
            phone: "555-0101".to_string(),
            email: Some("jane@example.org".to_string()),
            address: None,
            created_at: Utc::now(),
        };
        let doctor = User {
            id: 2,
            email: "greene@example.org".to_string(),
            password_hash: String::new(),
            first_name: "Mark".to_string(),
            last_name: "Greene".to_string(),
            role: Role::Doctor,
            is_active: true,
            created_at: Utc::now(),
        };
        let appointment = Appointment {
            id: 3,
            patient_id: 1,
            doctor_id: 2,
            appointment_date: Utc.with_ymd_and_hms(2026, 9, 1, 14, 30, 0).unwrap(),
            status: AppointmentStatus::Scheduled,
            notes: None,
            diagnosis: None,
            created_at: Utc::now(),
        };

        let (subject, body) = appointment_confirmation(&patient, &doctor, &appointment);
        assert_eq!(subject, "Appointment Confirmation");
        assert!(body.contains("Dear Jane"));
        assert!(body.contains("September 01, 2026 at 02:30 PM"));
        assert!(body.contains("Dr. Mark Greene"));
    }
}
