// models/src/medical/lab_test.rs
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};

/// Lab test lifecycle: pending → in_progress (optional) → completed, or
/// cancelled from either non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabTestStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl LabTestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LabTestStatus::Completed | LabTestStatus::Cancelled)
    }

    /// Results may be recorded only while the test is not terminal.
    pub fn accepts_results(&self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(&self, next: LabTestStatus) -> bool {
        use LabTestStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Completed)
                | (Pending, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LabTestStatus::Pending => "pending",
            LabTestStatus::InProgress => "in_progress",
            LabTestStatus::Completed => "completed",
            LabTestStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for LabTestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabTestStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(LabTestStatus::Pending),
            "in_progress" | "in-progress" => Ok(LabTestStatus::InProgress),
            "completed" => Ok(LabTestStatus::Completed),
            "cancelled" => Ok(LabTestStatus::Cancelled),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabTest {
    pub id: i32,
    pub patient_id: i32,
    pub doctor_id: i32,
    pub test_type: String,
    pub status: LabTestStatus,
    pub notes: Option<String>,
    pub results: Option<String>,
    pub normal_range: Option<String>,
    pub remarks: Option<String>,
    pub requested_by: Option<i32>,
    pub requested_date: DateTime<Utc>,
    pub completed_by: Option<i32>,
    pub completed_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::LabTestStatus::*;

    #[test]
    fn should_allow_the_documented_transitions() {
        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));
    }

    #[test]
    fn should_refuse_transitions_out_of_terminal_states() {
        for next in [Pending, InProgress, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn should_refuse_results_once_terminal() {
        assert!(Pending.accepts_results());
        assert!(InProgress.accepts_results());
        assert!(!Completed.accepts_results());
        assert!(!Cancelled.accepts_results());
    }
}
