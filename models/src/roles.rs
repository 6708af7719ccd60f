// models/src/roles.rs
//! Staff roles and the capability set each role is granted.
//!
//! Every workflow operation is gated on a single capability check instead of
//! ad-hoc role comparisons scattered through the call sites.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Doctor,
    Receptionist,
    Pharmacist,
    LabTechnician,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    ManageUsers,
    RegisterPatients,
    ViewPatients,
    ScheduleAppointments,
    ConductConsultations,
    ManageInventory,
    DispenseMedications,
    ManageLabTests,
    ManageBilling,
    ViewReports,
    ViewDashboard,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Doctor,
        Role::Receptionist,
        Role::Pharmacist,
        Role::LabTechnician,
    ];

    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Admin => &[
                ManageUsers,
                RegisterPatients,
                ViewPatients,
                ScheduleAppointments,
                ManageBilling,
                ViewReports,
                ViewDashboard,
            ],
            Role::Doctor => &[ViewPatients, ConductConsultations, ViewDashboard],
            Role::Receptionist => &[
                RegisterPatients,
                ViewPatients,
                ScheduleAppointments,
                ManageBilling,
                ViewDashboard,
            ],
            Role::Pharmacist => &[ManageInventory, DispenseMedications, ViewDashboard],
            Role::LabTechnician => &[ManageLabTests, ViewPatients, ViewDashboard],
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
            Role::Pharmacist => "pharmacist",
            Role::LabTechnician => "lab_technician",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "receptionist" => Ok(Role::Receptionist),
            "pharmacist" => Ok(Role::Pharmacist),
            "lab_technician" | "lab-technician" => Ok(Role::LabTechnician),
            other => Err(ValidationError::InvalidRole(other.to_string())),
        }
    }
}

impl Capability {
    /// Human-readable verb phrase used in permission-denied messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Capability::ManageUsers => "manage user accounts",
            Capability::RegisterPatients => "manage patient records",
            Capability::ViewPatients => "view patient records",
            Capability::ScheduleAppointments => "schedule appointments",
            Capability::ConductConsultations => "conduct consultations",
            Capability::ManageInventory => "manage the medication inventory",
            Capability::DispenseMedications => "dispense prescriptions",
            Capability::ManageLabTests => "manage lab tests",
            Capability::ManageBilling => "manage billing",
            Capability::ViewReports => "view reports",
            Capability::ViewDashboard => "view the dashboard",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Capability, Role};
    use core::str::FromStr;

    #[test]
    fn should_parse_role_from_str() {
        assert_eq!(Role::from_str("doctor").unwrap(), Role::Doctor);
        assert_eq!(Role::from_str("LAB_TECHNICIAN").unwrap(), Role::LabTechnician);
        assert!(Role::from_str("janitor").is_err());
    }

    #[test]
    fn should_round_trip_role_display() {
        for role in Role::ALL {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn should_scope_dispensing_to_pharmacists() {
        assert!(Role::Pharmacist.has_capability(Capability::DispenseMedications));
        for role in [Role::Admin, Role::Doctor, Role::Receptionist, Role::LabTechnician] {
            assert!(!role.has_capability(Capability::DispenseMedications));
        }
    }

    #[test]
    fn should_scope_consultations_to_doctors() {
        assert!(Role::Doctor.has_capability(Capability::ConductConsultations));
        assert!(!Role::Admin.has_capability(Capability::ConductConsultations));
    }

    #[test]
    fn should_grant_every_role_a_dashboard() {
        for role in Role::ALL {
            assert!(role.has_capability(Capability::ViewDashboard));
        }
    }
}
