// lib/src/services/dashboard.rs
//! Per-role dashboards and admin summary reports. Everything here is a
//! read-only aggregation; no workflow state is touched.

use chrono::{Duration, NaiveDate, Utc};

use models::dashboard::{
    AdminDashboard, AppointmentReport, Dashboard, DoctorDashboard, LaboratoryDashboard,
    PharmacyDashboard, ReceptionDashboard, RevenueReport,
};
use models::medical::{
    Appointment, AppointmentStatus, LabTestStatus, PaymentStatus, PrescriptionStatus,
};
use models::roles::{Capability, Role};
use models::{HospitalError, HospitalResult};

use crate::access::AuthContext;
use crate::database::Database;

/// How many entries the "recent"/"upcoming" dashboard panels show.
const PANEL_LIMIT: usize = 5;

#[derive(Clone, Debug)]
pub struct DashboardService {
    db: Database,
}

impl DashboardService {
    pub fn new(db: Database) -> Self {
        DashboardService { db }
    }

    pub async fn dashboard(&self, ctx: &AuthContext) -> HospitalResult<Dashboard> {
        ctx.require(Capability::ViewDashboard)?;
        match ctx.role {
            Role::Admin => Ok(Dashboard::Admin(self.admin_dashboard().await?)),
            Role::Doctor => Ok(Dashboard::Doctor(self.doctor_dashboard(ctx.user_id).await?)),
            Role::Receptionist => Ok(Dashboard::Reception(self.reception_dashboard().await?)),
            Role::Pharmacist => Ok(Dashboard::Pharmacy(self.pharmacy_dashboard().await?)),
            Role::LabTechnician => Ok(Dashboard::Laboratory(self.laboratory_dashboard().await?)),
        }
    }

    async fn admin_dashboard(&self) -> HospitalResult<AdminDashboard> {
        let today = Utc::now().date_naive();
        let appointments = self.db.storage.list_appointments().await?;
        let bills = self.db.storage.list_bills().await?;
        let cutoff = Utc::now() - Duration::days(30);

        let mut recent_bills = bills.clone();
        recent_bills.sort_by(|a, b| b.bill_date.cmp(&a.bill_date));
        recent_bills.truncate(PANEL_LIMIT);

        Ok(AdminDashboard {
            total_patients: self.db.storage.list_patients().await?.len(),
            total_appointments: appointments.len(),
            total_doctors: self.db.storage.users_by_role(Role::Doctor).await?.len(),
            today_appointments: on_day(&appointments, today),
            recent_bills,
            monthly_revenue: bills
                .iter()
                .filter(|b| b.payment_status == PaymentStatus::Paid && b.bill_date >= cutoff)
                .map(|b| b.total_amount)
                .sum(),
        })
    }

    async fn doctor_dashboard(&self, doctor_id: i32) -> HospitalResult<DoctorDashboard> {
        let today = Utc::now().date_naive();
        let appointments = self.db.storage.appointments_for_doctor(doctor_id).await?;

        let mut recent_prescriptions = self.db.storage.prescriptions_for_doctor(doctor_id).await?;
        recent_prescriptions.sort_by(|a, b| b.prescription_date.cmp(&a.prescription_date));
        recent_prescriptions.truncate(PANEL_LIMIT);

        let mut recent_lab_results: Vec<_> = self
            .db
            .storage
            .lab_tests_by_status(LabTestStatus::Completed)
            .await?
            .into_iter()
            .filter(|t| t.doctor_id == doctor_id)
            .collect();
        recent_lab_results.sort_by(|a, b| b.completed_date.cmp(&a.completed_date));
        recent_lab_results.truncate(PANEL_LIMIT);

        Ok(DoctorDashboard {
            today_appointments: on_day(&appointments, today),
            recent_prescriptions,
            recent_lab_results,
        })
    }

    async fn reception_dashboard(&self) -> HospitalResult<ReceptionDashboard> {
        let now = Utc::now();
        let appointments = self.db.storage.list_appointments().await?;

        let mut upcoming: Vec<Appointment> = appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Scheduled && a.appointment_date > now)
            .cloned()
            .collect();
        upcoming.sort_by_key(|a| a.appointment_date);
        upcoming.truncate(PANEL_LIMIT);

        Ok(ReceptionDashboard {
            today_appointments: on_day(&appointments, now.date_naive()),
            upcoming_appointments: upcoming,
        })
    }

    async fn pharmacy_dashboard(&self) -> HospitalResult<PharmacyDashboard> {
        let mut pending = self
            .db
            .storage
            .prescriptions_by_status(PrescriptionStatus::Pending)
            .await?;
        pending.sort_by(|a, b| b.prescription_date.cmp(&a.prescription_date));
        pending.truncate(PANEL_LIMIT);

        let mut dispensed = self
            .db
            .storage
            .prescriptions_by_status(PrescriptionStatus::Dispensed)
            .await?;
        dispensed.sort_by(|a, b| b.dispensed_at.cmp(&a.dispensed_at));
        dispensed.truncate(PANEL_LIMIT);

        Ok(PharmacyDashboard {
            low_stock: self.db.storage.low_stock_medications().await?,
            pending_prescriptions: pending,
            recently_dispensed: dispensed,
        })
    }

    async fn laboratory_dashboard(&self) -> HospitalResult<LaboratoryDashboard> {
        let today = Utc::now().date_naive();
        let completed = self
            .db
            .storage
            .lab_tests_by_status(LabTestStatus::Completed)
            .await?;

        let mut pending = self
            .db
            .storage
            .lab_tests_by_status(LabTestStatus::Pending)
            .await?;
        pending.sort_by(|a, b| b.requested_date.cmp(&a.requested_date));
        pending.truncate(PANEL_LIMIT);

        let mut recent = completed.clone();
        recent.sort_by(|a, b| b.completed_date.cmp(&a.completed_date));
        recent.truncate(PANEL_LIMIT);

        Ok(LaboratoryDashboard {
            pending_tests: pending,
            completed_today: completed
                .iter()
                .filter(|t| t.completed_date.map(|d| d.date_naive()) == Some(today))
                .count(),
            recent_results: recent,
        })
    }

    pub async fn revenue_report(
        &self,
        ctx: &AuthContext,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> HospitalResult<RevenueReport> {
        ctx.require(Capability::ViewReports)?;
        validate_range(start_date, end_date)?;
        let bills: Vec<_> = self
            .db
            .storage
            .list_bills()
            .await?
            .into_iter()
            .filter(|b| {
                let day = b.bill_date.date_naive();
                day >= start_date && day <= end_date
            })
            .collect();

        Ok(RevenueReport {
            start_date,
            end_date,
            bill_count: bills.len(),
            paid_count: bills
                .iter()
                .filter(|b| b.payment_status == PaymentStatus::Paid)
                .count(),
            total_billed: bills.iter().map(|b| b.total_amount).sum(),
            total_collected: bills
                .iter()
                .filter(|b| b.payment_status == PaymentStatus::Paid)
                .map(|b| b.total_amount)
                .sum(),
        })
    }

    pub async fn appointment_report(
        &self,
        ctx: &AuthContext,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> HospitalResult<AppointmentReport> {
        ctx.require(Capability::ViewReports)?;
        validate_range(start_date, end_date)?;
        let appointments: Vec<_> = self
            .db
            .storage
            .list_appointments()
            .await?
            .into_iter()
            .filter(|a| {
                let day = a.appointment_date.date_naive();
                day >= start_date && day <= end_date
            })
            .collect();

        let count = |status: AppointmentStatus| {
            appointments.iter().filter(|a| a.status == status).count()
        };
        Ok(AppointmentReport {
            start_date,
            end_date,
            scheduled: count(AppointmentStatus::Scheduled),
            completed: count(AppointmentStatus::Completed),
            cancelled: count(AppointmentStatus::Cancelled),
        })
    }
}

fn on_day(appointments: &[Appointment], day: NaiveDate) -> Vec<Appointment> {
    let mut todays: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.appointment_date.date_naive() == day)
        .cloned()
        .collect();
    todays.sort_by_key(|a| a.appointment_date);
    todays
}

fn validate_range(start_date: NaiveDate, end_date: NaiveDate) -> HospitalResult<()> {
    if start_date > end_date {
        return Err(HospitalError::InvalidInput(
            "start date is after end date".to_string(),
        ));
    }
    Ok(())
}
