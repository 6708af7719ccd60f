// server/src/cli/handlers_laboratory.rs
use std::str::FromStr;

use lib::commands::LabCommand;
use lib::services::laboratory::{NewLabTest, ResultEntry};
use models::medical::{LabTest, LabTestStatus};

use crate::cli::cli::{AppState, NOT_LOGGED_IN};
use crate::cli::handlers_utils::write_document;

pub async fn handle_lab_command(action: LabCommand, state: &AppState) -> String {
    let Some(ctx) = state.current_session().await else {
        return NOT_LOGGED_IN.to_string();
    };

    match action {
        LabCommand::Request {
            patient_id,
            doctor_id,
            test_type,
            notes,
        } => state
            .laboratory
            .request_test(
                &ctx,
                NewLabTest {
                    patient_id,
                    doctor_id,
                    test_type,
                    notes,
                },
            )
            .await
            .map(|test| format!("Lab test request created successfully. (id {})", test.id))
            .unwrap_or_else(|e| format!("Error: {}", e)),
        LabCommand::Tests { status } => {
            let status = match status.map(|raw| LabTestStatus::from_str(&raw)).transpose() {
                Ok(status) => status,
                Err(e) => return format!("Error: {}", e),
            };
            state
                .laboratory
                .tests(&ctx, status)
                .await
                .map(|tests| render_test_rows(&tests))
                .unwrap_or_else(|e| format!("Error: {}", e))
        }
        LabCommand::Start { test_id } => state
            .laboratory
            .start_test(&ctx, test_id)
            .await
            .map(|test| format!("Lab test {} is now {}.", test.id, test.status))
            .unwrap_or_else(|e| format!("Error: {}", e)),
        LabCommand::Result {
            test_id,
            results,
            normal_range,
            remarks,
        } => state
            .laboratory
            .record_result(
                &ctx,
                test_id,
                ResultEntry {
                    results,
                    normal_range,
                    remarks,
                },
            )
            .await
            .map(|_| "Test results updated successfully.".to_string())
            .unwrap_or_else(|e| format!("Error: {}", e)),
        LabCommand::Cancel { test_id } => state
            .laboratory
            .cancel_test(&ctx, test_id)
            .await
            .map(|_| "Lab test cancelled.".to_string())
            .unwrap_or_else(|e| format!("Error: {}", e)),
        LabCommand::Report { test_id, output } => {
            match state.laboratory.generate_report(&ctx, test_id).await {
                Ok(bytes) => {
                    write_document(output, &format!("lab_report_{}.txt", test_id), &bytes)
                }
                Err(e) => format!("Error: {}", e),
            }
        }
        LabCommand::History { patient_id } => state
            .laboratory
            .patient_history(&ctx, patient_id)
            .await
            .map(|tests| render_test_rows(&tests))
            .unwrap_or_else(|e| format!("Error: {}", e)),
    }
}

fn render_test_rows(tests: &[LabTest]) -> String {
    if tests.is_empty() {
        return "No lab tests found.".to_string();
    }
    tests
        .iter()
        .map(|t| {
            format!(
                "{:>4}  patient {:>4}  {:<30} {}  {}",
                t.id,
                t.patient_id,
                t.test_type,
                t.requested_date.format("%Y-%m-%d"),
                t.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
