// lib/src/services/billing.rs
//! Billing aggregator. A bill's total is a snapshot of Σ(quantity ×
//! unit_price) taken at creation; later price changes never touch it.
//! Payment transitions are one-way out of pending.

use std::sync::Arc;

use chrono::Utc;
use log::info;

use models::medical::{Bill, BillItem, BillItemType, PaymentStatus};
use models::roles::Capability;
use models::{HospitalError, HospitalResult, ValidationError};

use crate::access::AuthContext;
use crate::database::Database;
use crate::reports::DocumentRenderer;
use crate::storage_engine::{Precondition, WriteBatch, WriteOp};

#[derive(Debug, Clone)]
pub struct NewBillItem {
    pub item_type: BillItemType,
    pub reference_id: Option<i32>,
    pub description: String,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Clone, Debug)]
pub struct BillingService {
    db: Database,
    renderer: Arc<dyn DocumentRenderer>,
}

impl BillingService {
    pub fn new(db: Database, renderer: Arc<dyn DocumentRenderer>) -> Self {
        BillingService { db, renderer }
    }

    pub async fn create_bill(
        &self,
        ctx: &AuthContext,
        patient_id: i32,
        items: Vec<NewBillItem>,
    ) -> HospitalResult<Bill> {
        ctx.require(Capability::ManageBilling)?;
        if self.db.storage.get_patient(patient_id).await?.is_none() {
            return Err(HospitalError::not_found("patient", patient_id));
        }
        if items.is_empty() {
            return Err(HospitalError::InvalidInput(
                "a bill requires at least one line item".to_string(),
            ));
        }

        let mut bill_items = Vec::with_capacity(items.len());
        for item in items {
            if item.description.trim().is_empty() {
                return Err(ValidationError::Required("description".to_string()).into());
            }
            if item.quantity <= 0 {
                return Err(ValidationError::NonPositiveQuantity("quantity".to_string()).into());
            }
            if !item.unit_price.is_finite() || item.unit_price < 0.0 {
                return Err(ValidationError::NegativeAmount("unit_price".to_string()).into());
            }
            bill_items.push(BillItem {
                item_type: item.item_type,
                reference_id: item.reference_id,
                description: item.description,
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.quantity as f64 * item.unit_price,
            });
        }
        let total_amount = bill_items.iter().map(|i| i.total_price).sum();

        let bill = Bill {
            id: 0,
            patient_id,
            bill_date: Utc::now(),
            total_amount,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            items: bill_items,
        };
        let bill = self.db.storage.insert_bill(bill).await?;
        info!(
            "created bill {} for patient {} ({:.2})",
            bill.id, patient_id, bill.total_amount
        );
        Ok(bill)
    }

    pub async fn mark_paid(
        &self,
        ctx: &AuthContext,
        bill_id: i32,
        payment_method: String,
    ) -> HospitalResult<Bill> {
        self.transition(ctx, bill_id, PaymentStatus::Paid, Some(payment_method))
            .await
    }

    pub async fn cancel_bill(&self, ctx: &AuthContext, bill_id: i32) -> HospitalResult<Bill> {
        self.transition(ctx, bill_id, PaymentStatus::Cancelled, None).await
    }

    async fn transition(
        &self,
        ctx: &AuthContext,
        bill_id: i32,
        next: PaymentStatus,
        payment_method: Option<String>,
    ) -> HospitalResult<Bill> {
        ctx.require(Capability::ManageBilling)?;
        let mut bill = self
            .db
            .storage
            .get_bill(bill_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("bill", bill_id))?;
        if !bill.payment_status.can_transition_to(next) {
            return Err(HospitalError::InvalidState(format!(
                "bill {} is {}",
                bill_id, bill.payment_status
            )));
        }
        bill.payment_status = next;
        if payment_method.is_some() {
            bill.payment_method = payment_method;
        }

        let batch = WriteBatch::new()
            .require(Precondition::BillInStatus {
                id: bill_id,
                status: PaymentStatus::Pending,
            })
            .push(WriteOp::PutBill(bill.clone()));
        self.db.storage.apply_batch(batch).await?;
        Ok(bill)
    }

    pub async fn get_bill(&self, ctx: &AuthContext, bill_id: i32) -> HospitalResult<Bill> {
        ctx.require(Capability::ManageBilling)?;
        self.db
            .storage
            .get_bill(bill_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("bill", bill_id))
    }

    pub async fn bills_for_patient(
        &self,
        ctx: &AuthContext,
        patient_id: i32,
    ) -> HospitalResult<Vec<Bill>> {
        ctx.require(Capability::ManageBilling)?;
        self.db.storage.bills_for_patient(patient_id).await
    }

    pub async fn list_bills(&self, ctx: &AuthContext) -> HospitalResult<Vec<Bill>> {
        ctx.require(Capability::ManageBilling)?;
        self.db.storage.list_bills().await
    }

    /// Renders the downloadable invoice for a bill.
    pub async fn generate_invoice(&self, ctx: &AuthContext, bill_id: i32) -> HospitalResult<Vec<u8>> {
        ctx.require(Capability::ManageBilling)?;
        let bill = self
            .db
            .storage
            .get_bill(bill_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("bill", bill_id))?;
        let patient = self
            .db
            .storage
            .get_patient(bill.patient_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("patient", bill.patient_id))?;
        self.renderer.render_invoice(&bill, &patient)
    }
}
