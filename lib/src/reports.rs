// lib/src/reports.rs
//! Document rendering boundary. The domain layer enforces the lifecycle
//! preconditions (a lab report requires a completed test) and hands a
//! finalized record to the renderer; the renderer only formats.

use models::medical::{Bill, LabTest, Patient};
use models::HospitalResult;

pub trait DocumentRenderer: std::fmt::Debug + Send + Sync {
    fn render_invoice(&self, bill: &Bill, patient: &Patient) -> HospitalResult<Vec<u8>>;
    fn render_lab_report(&self, test: &LabTest, patient: &Patient) -> HospitalResult<Vec<u8>>;
}

/// Plain-text renderer used by the CLI and tests. A PDF renderer is an
/// external collaborator implementing the same trait.
#[derive(Debug, Clone)]
pub struct PlainTextRenderer {
    pub hospital_name: String,
}

impl PlainTextRenderer {
    pub fn new(hospital_name: impl Into<String>) -> Self {
        PlainTextRenderer {
            hospital_name: hospital_name.into(),
        }
    }
}

impl DocumentRenderer for PlainTextRenderer {
    fn render_invoice(&self, bill: &Bill, patient: &Patient) -> HospitalResult<Vec<u8>> {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.hospital_name));
        out.push_str(&format!("Invoice #{}\n\n", bill.id));
        out.push_str(&format!("Patient: {}\n", patient.full_name()));
        out.push_str(&format!(
            "Date: {}\n",
            bill.bill_date.format("%B %d, %Y")
        ));
        out.push_str(&format!("Status: {}\n\n", bill.payment_status));
        out.push_str("Description                              Qty    Unit      Total\n");
        for item in &bill.items {
            out.push_str(&format!(
                "{:<40} {:>3} {:>8.2} {:>10.2}\n",
                item.description, item.quantity, item.unit_price, item.total_price
            ));
        }
        out.push_str(&format!("\nTotal Amount: {:.2}\n", bill.total_amount));
        Ok(out.into_bytes())
    }

    fn render_lab_report(&self, test: &LabTest, patient: &Patient) -> HospitalResult<Vec<u8>> {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.hospital_name));
        out.push_str(&format!("Lab Report #{}\n\n", test.id));
        out.push_str(&format!("Patient: {}\n", patient.full_name()));
        out.push_str(&format!("Test: {}\n", test.test_type));
        out.push_str(&format!(
            "Requested: {}\n",
            test.requested_date.format("%B %d, %Y")
        ));
        if let Some(completed) = test.completed_date {
            out.push_str(&format!("Completed: {}\n", completed.format("%B %d, %Y")));
        }
        out.push('\n');
        if let Some(ref results) = test.results {
            out.push_str(&format!("Results: {}\n", results));
        }
        if let Some(ref range) = test.normal_range {
            out.push_str(&format!("Normal range: {}\n", range));
        }
        if let Some(ref remarks) = test.remarks {
            out.push_str(&format!("Remarks: {}\n", remarks));
        }
        Ok(out.into_bytes())
    }
}
