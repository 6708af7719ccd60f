// server/src/cli/handlers_patient.rs
use lib::commands::PatientCommand;
use lib::services::patients::NewPatient;
use models::medical::Patient;

use crate::cli::cli::{AppState, NOT_LOGGED_IN};
use crate::cli::handlers_utils::parse_date;

pub async fn handle_patient_command(action: PatientCommand, state: &AppState) -> String {
    let Some(ctx) = state.current_session().await else {
        return NOT_LOGGED_IN.to_string();
    };

    match action {
        PatientCommand::Register {
            first_name,
            last_name,
            dob,
            gender,
            phone,
            blood_group,
            email,
            address,
        } => {
            let date_of_birth = match parse_date(&dob) {
                Ok(date) => date,
                Err(e) => return format!("Error: {}", e),
            };
            state
                .patients
                .register_patient(
                    &ctx,
                    NewPatient {
                        first_name,
                        last_name,
                        date_of_birth,
                        gender,
                        blood_group,
                        phone,
                        email,
                        address,
                    },
                )
                .await
                .map(|patient| {
                    format!(
                        "Patient registered successfully! (id {}, {})",
                        patient.id,
                        patient.full_name()
                    )
                })
                .unwrap_or_else(|e| format!("Error: {}", e))
        }
        PatientCommand::View { patient_id } => {
            let patient = match state.patients.get_patient(&ctx, patient_id).await {
                Ok(patient) => patient,
                Err(e) => return format!("Error: {}", e),
            };
            let appointments = state
                .scheduling
                .appointments_for_patient(&ctx, patient_id)
                .await
                .unwrap_or_default();
            let mut out = format!(
                "#{} {}\n  born {}  gender {}  phone {}\n",
                patient.id,
                patient.full_name(),
                patient.date_of_birth,
                patient.gender,
                patient.phone
            );
            if let Some(ref email) = patient.email {
                out.push_str(&format!("  email {}\n", email));
            }
            out.push_str(&format!("  {} appointment(s)\n", appointments.len()));
            for appointment in appointments {
                out.push_str(&format!(
                    "    {:>4}  {}  {}\n",
                    appointment.id,
                    appointment.appointment_date.format("%Y-%m-%d %H:%M"),
                    appointment.status
                ));
            }
            out
        }
        PatientCommand::Delete { patient_id } => state
            .patients
            .delete_patient(&ctx, patient_id)
            .await
            .map(|_| "Patient and owned records deleted.".to_string())
            .unwrap_or_else(|e| format!("Error: {}", e)),
        PatientCommand::Search { query } => state
            .patients
            .search_patients(&ctx, &query)
            .await
            .map(|patients| render_patient_rows(&patients))
            .unwrap_or_else(|e| format!("Error: {}", e)),
        PatientCommand::List => state
            .patients
            .list_patients(&ctx)
            .await
            .map(|patients| render_patient_rows(&patients))
            .unwrap_or_else(|e| format!("Error: {}", e)),
    }
}

fn render_patient_rows(patients: &[Patient]) -> String {
    if patients.is_empty() {
        return "No patients found.".to_string();
    }
    patients
        .iter()
        .map(|p| {
            format!(
                "{:>4}  {:<30} {}  {}",
                p.id,
                p.full_name(),
                p.date_of_birth,
                p.phone
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
