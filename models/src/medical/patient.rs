// models/src/medical/patient.rs
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Demographic record. A patient owns its appointments, prescriptions and
/// lab tests; deleting a patient cascades to all three.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub blood_group: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn age_on(&self, date: NaiveDate) -> i32 {
        let mut age = date.year() - self.date_of_birth.year();
        if (date.month(), date.day()) < (self.date_of_birth.month(), self.date_of_birth.day()) {
            age -= 1;
        }
        age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_compute_age_relative_to_birthday() {
        let patient = Patient {
            id: 1,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            gender: "female".to_string(),
            blood_group: None,
            phone: "555-0100".to_string(),
            email: None,
            address: None,
            created_at: Utc::now(),
        };
        assert_eq!(patient.age_on(NaiveDate::from_ymd_opt(2026, 6, 14).unwrap()), 35);
        assert_eq!(patient.age_on(NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()), 36);
    }
}
