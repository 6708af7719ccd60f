// server/src/cli/handlers_appointment.rs
use chrono::Utc;

use lib::commands::AppointmentCommand;
use lib::services::consultation::ConsultationOutcome;
use lib::services::scheduling::{available_slots, NewAppointment};
use models::medical::Appointment;

use crate::cli::cli::{AppState, NOT_LOGGED_IN};
use crate::cli::handlers_utils::{parse_datetime, parse_lab_request, parse_medication_line};

pub async fn handle_appointment_command(action: AppointmentCommand, state: &AppState) -> String {
    let Some(ctx) = state.current_session().await else {
        return NOT_LOGGED_IN.to_string();
    };

    match action {
        AppointmentCommand::Schedule {
            patient_id,
            doctor_id,
            date,
            notes,
        } => {
            let appointment_date = match parse_datetime(&date) {
                Ok(date) => date,
                Err(e) => return format!("Error: {}", e),
            };
            state
                .scheduling
                .schedule_appointment(
                    &ctx,
                    NewAppointment {
                        patient_id,
                        doctor_id,
                        appointment_date,
                        notes,
                    },
                )
                .await
                .map(|appointment| {
                    format!(
                        "Appointment scheduled successfully! (id {}, {})",
                        appointment.id,
                        appointment.appointment_date.format("%Y-%m-%d %H:%M")
                    )
                })
                .unwrap_or_else(|e| format!("Error: {}", e))
        }
        AppointmentCommand::Cancel { appointment_id } => state
            .scheduling
            .cancel_appointment(&ctx, appointment_id)
            .await
            .map(|_| "Appointment cancelled.".to_string())
            .unwrap_or_else(|e| format!("Error: {}", e)),
        AppointmentCommand::List => state
            .scheduling
            .list_appointments(&ctx)
            .await
            .map(|appointments| render_appointment_rows(&appointments))
            .unwrap_or_else(|e| format!("Error: {}", e)),
        AppointmentCommand::Mine => state
            .scheduling
            .appointments_for_doctor(&ctx, ctx.user_id)
            .await
            .map(|appointments| render_appointment_rows(&appointments))
            .unwrap_or_else(|e| format!("Error: {}", e)),
        AppointmentCommand::Slots => {
            let slots = available_slots(&state.config.scheduling, Utc::now());
            if slots.is_empty() {
                "No slots left today.".to_string()
            } else {
                slots
                    .iter()
                    .map(|s| s.format("%H:%M").to_string())
                    .collect::<Vec<_>>()
                    .join("  ")
            }
        }
        AppointmentCommand::Complete {
            appointment_id,
            diagnosis,
            notes,
            medications,
            lab_requests,
        } => {
            let mut parsed_medications = Vec::with_capacity(medications.len());
            for raw in &medications {
                match parse_medication_line(raw) {
                    Ok(line) => parsed_medications.push(line),
                    Err(e) => return format!("Error: {}", e),
                }
            }
            let mut parsed_labs = Vec::with_capacity(lab_requests.len());
            for raw in &lab_requests {
                match parse_lab_request(raw) {
                    Ok(request) => parsed_labs.push(request),
                    Err(e) => return format!("Error: {}", e),
                }
            }

            state
                .consultations
                .complete_consultation(
                    &ctx,
                    appointment_id,
                    ConsultationOutcome {
                        diagnosis,
                        notes,
                        medications: parsed_medications,
                        lab_requests: parsed_labs,
                    },
                )
                .await
                .map(|record| {
                    let mut out = "Consultation completed successfully.".to_string();
                    if let Some(prescription) = record.prescription {
                        out.push_str(&format!(" Prescription {} created.", prescription.id));
                    }
                    if !record.lab_tests.is_empty() {
                        let ids: Vec<String> = record
                            .lab_tests
                            .iter()
                            .map(|t| t.id.to_string())
                            .collect();
                        out.push_str(&format!(" Lab test(s) {} requested.", ids.join(", ")));
                    }
                    out
                })
                .unwrap_or_else(|e| format!("Error: {}", e))
        }
    }
}

fn render_appointment_rows(appointments: &[Appointment]) -> String {
    if appointments.is_empty() {
        return "No appointments found.".to_string();
    }
    appointments
        .iter()
        .map(|a| {
            format!(
                "{:>4}  patient {:>4}  doctor {:>4}  {}  {}",
                a.id,
                a.patient_id,
                a.doctor_id,
                a.appointment_date.format("%Y-%m-%d %H:%M"),
                a.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
