// lib/src/commands.rs
//! Command definitions for the server CLI. The server crate parses these
//! and dispatches to the workflow services; keeping the enums here lets the
//! handlers and the services share argument types.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

/// Direction of a manual stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StockOperation {
    Add,
    Subtract,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Authenticate and start a session
    Login { email: String, password: String },
    /// End the current session
    Logout,
    /// Show the logged-in identity
    Whoami,
    /// Show the dashboard for the logged-in role
    Dashboard,
    /// Staff account administration
    #[clap(subcommand)]
    User(UserCommand),
    /// Patient registry
    #[clap(subcommand)]
    Patient(PatientCommand),
    /// Appointment scheduling and consultations
    #[clap(subcommand)]
    Appointment(AppointmentCommand),
    /// Medication inventory and prescription dispensing
    #[clap(subcommand)]
    Pharmacy(PharmacyCommand),
    /// Lab test lifecycle
    #[clap(subcommand)]
    Lab(LabCommand),
    /// Bills and invoices
    #[clap(subcommand)]
    Billing(BillingCommand),
    /// Summary reports
    #[clap(subcommand)]
    Report(ReportCommand),
    /// Run CLI in interactive mode
    Interactive,
    /// Exit interactive mode
    Exit,
}

#[derive(Debug, Clone, Subcommand)]
pub enum UserCommand {
    /// Register a staff account (admin only)
    Register {
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// admin, doctor, receptionist, pharmacist or lab_technician
        #[arg(long)]
        role: String,
    },
    /// List staff accounts
    List,
    /// Edit a staff account
    Update {
        user_id: i32,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Deactivate a staff account
    Deactivate { user_id: i32 },
    /// Reactivate a staff account
    Activate { user_id: i32 },
    /// Delete a staff account
    Delete { user_id: i32 },
}

#[derive(Debug, Clone, Subcommand)]
pub enum PatientCommand {
    /// Register a patient
    Register {
        first_name: String,
        last_name: String,
        /// Date of birth, YYYY-MM-DD
        #[arg(long)]
        dob: String,
        #[arg(long)]
        gender: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        blood_group: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Show one patient with their appointment history
    View { patient_id: i32 },
    /// Delete a patient and everything they own
    Delete { patient_id: i32 },
    /// Search patients by name or phone
    Search { query: String },
    /// List all patients
    List,
}

#[derive(Debug, Clone, Subcommand)]
pub enum AppointmentCommand {
    /// Schedule an appointment and send the confirmation
    Schedule {
        patient_id: i32,
        doctor_id: i32,
        /// Date and time, "YYYY-MM-DD HH:MM" (UTC)
        #[arg(long)]
        date: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Cancel a scheduled appointment
    Cancel { appointment_id: i32 },
    /// List all appointments
    List,
    /// List the logged-in doctor's appointments
    Mine,
    /// Remaining bookable slots for today
    Slots,
    /// Complete a consultation (assigned doctor only)
    Complete {
        appointment_id: i32,
        #[arg(long)]
        diagnosis: String,
        #[arg(long)]
        notes: Option<String>,
        /// Medication line, "medication_id:dosage:frequency:duration:quantity"; repeatable
        #[arg(long = "med")]
        medications: Vec<String>,
        /// Lab request, "test_type" or "test_type:notes"; repeatable
        #[arg(long = "lab")]
        lab_requests: Vec<String>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum PharmacyCommand {
    /// Add a medication to the inventory
    AddMedication {
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        manufacturer: Option<String>,
        #[arg(long)]
        unit_price: f64,
        #[arg(long)]
        stock: i32,
        #[arg(long, default_value_t = 10)]
        reorder_level: i32,
    },
    /// List the medication inventory
    Medications,
    /// Medications at or below their reorder level
    LowStock,
    /// List prescriptions, optionally filtered by status
    Prescriptions {
        #[arg(long)]
        status: Option<String>,
    },
    /// Dispense a pending prescription
    Dispense {
        prescription_id: i32,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Adjust stock up or down
    Stock {
        medication_id: i32,
        #[arg(value_enum)]
        operation: StockOperation,
        quantity: i32,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum LabCommand {
    /// Enter a standalone test request
    Request {
        patient_id: i32,
        doctor_id: i32,
        test_type: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List lab tests, optionally filtered by status
    Tests {
        #[arg(long)]
        status: Option<String>,
    },
    /// Move a pending test to in_progress
    Start { test_id: i32 },
    /// Record results and complete the test
    Result {
        test_id: i32,
        #[arg(long)]
        results: String,
        #[arg(long)]
        normal_range: Option<String>,
        #[arg(long)]
        remarks: Option<String>,
    },
    /// Cancel a non-terminal test
    Cancel { test_id: i32 },
    /// Write the report of a completed test to a file
    Report {
        test_id: i32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// A patient's full test history
    History { patient_id: i32 },
}

#[derive(Debug, Clone, Subcommand)]
pub enum BillingCommand {
    /// Create a bill from line items
    Create {
        patient_id: i32,
        /// Line item, "type:description:quantity:unit_price[:reference_id]";
        /// type is consultation, medication, lab_test or procedure; repeatable
        #[arg(long = "item")]
        items: Vec<String>,
    },
    /// Show one bill
    View { bill_id: i32 },
    /// List all bills
    List,
    /// Mark a pending bill paid
    Pay {
        bill_id: i32,
        #[arg(long)]
        method: String,
    },
    /// Cancel a pending bill
    Cancel { bill_id: i32 },
    /// Write the invoice to a file
    Invoice {
        bill_id: i32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ReportCommand {
    /// Billing totals over a date range (defaults to the last 30 days)
    Revenue {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Appointment volume over a date range
    Appointments {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
}
