// server/src/cli/handlers_pharmacy.rs
use std::str::FromStr;

use lib::commands::PharmacyCommand;
use lib::services::pharmacy::NewMedication;
use models::medical::{Medication, Prescription, PrescriptionStatus};

use crate::cli::cli::{AppState, NOT_LOGGED_IN};

pub async fn handle_pharmacy_command(action: PharmacyCommand, state: &AppState) -> String {
    let Some(ctx) = state.current_session().await else {
        return NOT_LOGGED_IN.to_string();
    };

    match action {
        PharmacyCommand::AddMedication {
            name,
            category,
            description,
            manufacturer,
            unit_price,
            stock,
            reorder_level,
        } => state
            .pharmacy
            .add_medication(
                &ctx,
                NewMedication {
                    name,
                    category,
                    description,
                    manufacturer,
                    unit_price,
                    stock_quantity: stock,
                    reorder_level,
                },
            )
            .await
            .map(|medication| {
                format!(
                    "Medication added successfully. (id {}, {})",
                    medication.id, medication.name
                )
            })
            .unwrap_or_else(|e| format!("Error: {}", e)),
        PharmacyCommand::Medications => state
            .pharmacy
            .list_medications(&ctx)
            .await
            .map(|medications| render_medication_rows(&medications))
            .unwrap_or_else(|e| format!("Error: {}", e)),
        PharmacyCommand::LowStock => state
            .pharmacy
            .low_stock(&ctx)
            .await
            .map(|medications| {
                if medications.is_empty() {
                    "No medications below their reorder level.".to_string()
                } else {
                    render_medication_rows(&medications)
                }
            })
            .unwrap_or_else(|e| format!("Error: {}", e)),
        PharmacyCommand::Prescriptions { status } => {
            let status = match status
                .map(|raw| PrescriptionStatus::from_str(&raw))
                .transpose()
            {
                Ok(status) => status,
                Err(e) => return format!("Error: {}", e),
            };
            state
                .pharmacy
                .prescriptions(&ctx, status)
                .await
                .map(|prescriptions| render_prescription_rows(&prescriptions))
                .unwrap_or_else(|e| format!("Error: {}", e))
        }
        PharmacyCommand::Dispense {
            prescription_id,
            notes,
        } => state
            .pharmacy
            .dispense(&ctx, prescription_id, notes)
            .await
            .map(|_| "Prescription dispensed successfully.".to_string())
            .unwrap_or_else(|e| format!("Error: {}", e)),
        PharmacyCommand::Stock {
            medication_id,
            operation,
            quantity,
        } => state
            .pharmacy
            .adjust_stock(&ctx, medication_id, operation, quantity)
            .await
            .map(|medication| {
                format!(
                    "Stock updated successfully. {}: {} in stock.",
                    medication.name, medication.stock_quantity
                )
            })
            .unwrap_or_else(|e| format!("Error: {}", e)),
    }
}

fn render_medication_rows(medications: &[Medication]) -> String {
    if medications.is_empty() {
        return "No medications found.".to_string();
    }
    medications
        .iter()
        .map(|m| {
            format!(
                "{:>4}  {:<30} {:<15} {:>8.2}  stock {:>4} (reorder at {})",
                m.id, m.name, m.category, m.unit_price, m.stock_quantity, m.reorder_level
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_prescription_rows(prescriptions: &[Prescription]) -> String {
    if prescriptions.is_empty() {
        return "No prescriptions found.".to_string();
    }
    prescriptions
        .iter()
        .map(|p| {
            format!(
                "{:>4}  patient {:>4}  doctor {:>4}  {} line(s)  {}",
                p.id,
                p.patient_id,
                p.doctor_id,
                p.medications.len(),
                p.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
