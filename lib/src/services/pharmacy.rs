// lib/src/services/pharmacy.rs
//! Medication inventory and prescription dispensing.
//!
//! Dispensing is check-then-commit as one unit: every line is verified
//! against stock (in list order, cumulatively) before anything is written,
//! and the commit itself re-validates under the storage engine's lock. A
//! prescription is never partially dispensed and stock never goes negative.

use std::collections::HashMap;

use chrono::Utc;
use log::info;

use models::medical::{Medication, Prescription, PrescriptionStatus};
use models::roles::Capability;
use models::{HospitalError, HospitalResult, ValidationError};

use crate::access::AuthContext;
use crate::commands::StockOperation;
use crate::database::Database;
use crate::storage_engine::{Precondition, WriteBatch, WriteOp};

#[derive(Debug, Clone)]
pub struct NewMedication {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub unit_price: f64,
    pub stock_quantity: i32,
    pub reorder_level: i32,
}

#[derive(Clone, Debug)]
pub struct PharmacyService {
    db: Database,
}

impl PharmacyService {
    pub fn new(db: Database) -> Self {
        PharmacyService { db }
    }

    pub async fn add_medication(
        &self,
        ctx: &AuthContext,
        new: NewMedication,
    ) -> HospitalResult<Medication> {
        ctx.require(Capability::ManageInventory)?;
        validate_medication_fields(&new.name, &new.category, new.unit_price)?;
        if new.stock_quantity < 0 {
            return Err(ValidationError::NegativeAmount("stock_quantity".to_string()).into());
        }
        if new.reorder_level < 0 {
            return Err(ValidationError::NegativeAmount("reorder_level".to_string()).into());
        }

        let medication = Medication {
            id: 0,
            name: new.name,
            category: new.category,
            description: new.description,
            manufacturer: new.manufacturer,
            unit_price: new.unit_price,
            stock_quantity: new.stock_quantity,
            reorder_level: new.reorder_level,
            created_at: Utc::now(),
        };
        self.db.storage.insert_medication(medication).await
    }

    pub async fn update_medication(
        &self,
        ctx: &AuthContext,
        medication: Medication,
    ) -> HospitalResult<()> {
        ctx.require(Capability::ManageInventory)?;
        validate_medication_fields(&medication.name, &medication.category, medication.unit_price)?;
        self.db.storage.update_medication(medication).await
    }

    pub async fn get_medication(
        &self,
        ctx: &AuthContext,
        medication_id: i32,
    ) -> HospitalResult<Medication> {
        ctx.require(Capability::ManageInventory)?;
        self.db
            .storage
            .get_medication(medication_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("medication", medication_id))
    }

    pub async fn list_medications(&self, ctx: &AuthContext) -> HospitalResult<Vec<Medication>> {
        ctx.require(Capability::ManageInventory)?;
        self.db.storage.list_medications().await
    }

    /// Medications at or below their reorder level.
    pub async fn low_stock(&self, ctx: &AuthContext) -> HospitalResult<Vec<Medication>> {
        ctx.require(Capability::ManageInventory)?;
        self.db.storage.low_stock_medications().await
    }

    pub async fn prescriptions(
        &self,
        ctx: &AuthContext,
        status: Option<PrescriptionStatus>,
    ) -> HospitalResult<Vec<Prescription>> {
        ctx.require(Capability::DispenseMedications)?;
        match status {
            Some(status) => self.db.storage.prescriptions_by_status(status).await,
            None => self.db.storage.list_prescriptions().await,
        }
    }

    /// Dispenses a pending prescription: verifies every line against stock
    /// in list order, then decrements all lines and marks the prescription
    /// dispensed in one atomic commit. The first short line aborts the
    /// whole operation with no stock movement.
    pub async fn dispense(
        &self,
        ctx: &AuthContext,
        prescription_id: i32,
        notes: Option<String>,
    ) -> HospitalResult<Prescription> {
        ctx.require(Capability::DispenseMedications)?;
        let mut prescription = self
            .db
            .storage
            .get_prescription(prescription_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("prescription", prescription_id))?;
        if !prescription.is_pending() {
            return Err(HospitalError::InvalidState(format!(
                "prescription {} has already been dispensed",
                prescription_id
            )));
        }

        // Verify all lines before touching anything. `claimed` tracks how
        // much earlier lines already took from each medication so repeated
        // medications are checked cumulatively.
        let mut claimed: HashMap<i32, i32> = HashMap::new();
        for line in &prescription.medications {
            let medication = self
                .db
                .storage
                .get_medication(line.medication_id)
                .await?
                .ok_or_else(|| HospitalError::not_found("medication", line.medication_id))?;
            let already = claimed.get(&line.medication_id).copied().unwrap_or(0);
            let available = medication.stock_quantity - already;
            if available < line.quantity {
                return Err(HospitalError::InsufficientStock {
                    medication: medication.name,
                    requested: line.quantity,
                    available,
                });
            }
            claimed.insert(line.medication_id, already + line.quantity);
        }

        prescription.status = PrescriptionStatus::Dispensed;
        prescription.dispensed_by = Some(ctx.user_id);
        prescription.dispensed_at = Some(Utc::now());
        prescription.dispensing_notes = notes;

        let mut batch = WriteBatch::new()
            .require(Precondition::PrescriptionInStatus {
                id: prescription_id,
                status: PrescriptionStatus::Pending,
            })
            .push(WriteOp::PutPrescription(prescription.clone()));
        for line in &prescription.medications {
            batch = batch.push(WriteOp::AdjustMedicationStock {
                medication_id: line.medication_id,
                delta: -line.quantity,
            });
        }
        self.db.storage.apply_batch(batch).await?;

        info!(
            "prescription {} dispensed by pharmacist {}",
            prescription_id, ctx.user_id
        );
        Ok(prescription)
    }

    /// Manual stock adjustment. Additions are unconditional; subtractions
    /// are refused when they exceed the current stock.
    pub async fn adjust_stock(
        &self,
        ctx: &AuthContext,
        medication_id: i32,
        operation: StockOperation,
        quantity: i32,
    ) -> HospitalResult<Medication> {
        ctx.require(Capability::ManageInventory)?;
        if quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity("quantity".to_string()).into());
        }
        let medication = self
            .db
            .storage
            .get_medication(medication_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("medication", medication_id))?;

        let delta = match operation {
            StockOperation::Add => quantity,
            StockOperation::Subtract => {
                if quantity > medication.stock_quantity {
                    return Err(HospitalError::InsufficientStock {
                        medication: medication.name,
                        requested: quantity,
                        available: medication.stock_quantity,
                    });
                }
                -quantity
            }
        };
        let batch = WriteBatch::new().push(WriteOp::AdjustMedicationStock {
            medication_id,
            delta,
        });
        self.db.storage.apply_batch(batch).await?;

        self.db
            .storage
            .get_medication(medication_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("medication", medication_id))
    }
}

fn validate_medication_fields(name: &str, category: &str, unit_price: f64) -> HospitalResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required("name".to_string()).into());
    }
    if category.trim().is_empty() {
        return Err(ValidationError::Required("category".to_string()).into());
    }
    if !unit_price.is_finite() || unit_price < 0.0 {
        return Err(ValidationError::NegativeAmount("unit_price".to_string()).into());
    }
    Ok(())
}
