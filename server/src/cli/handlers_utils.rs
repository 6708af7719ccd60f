// server/src/cli/handlers_utils.rs
//! Small argument parsers shared by the handlers. Each returns a
//! user-facing message on failure, never a panic.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use lib::services::billing::NewBillItem;
use lib::services::consultation::{LabRequest, MedicationLine};
use models::medical::BillItemType;

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a valid date (expected YYYY-MM-DD)", value))
}

pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%d %H:%M")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| {
            format!(
                "'{}' is not a valid date and time (expected YYYY-MM-DD HH:MM)",
                value
            )
        })
}

/// "medication_id:dosage:frequency:duration:quantity"
pub fn parse_medication_line(value: &str) -> Result<MedicationLine, String> {
    let parts: Vec<&str> = value.splitn(5, ':').collect();
    if parts.len() != 5 {
        return Err(format!(
            "'{}' is not a valid medication line (expected id:dosage:frequency:duration:quantity)",
            value
        ));
    }
    let medication_id = parts[0]
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("'{}' is not a valid medication id", parts[0]))?;
    let quantity = parts[4]
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("'{}' is not a valid quantity", parts[4]))?;
    Ok(MedicationLine {
        medication_id,
        dosage: parts[1].trim().to_string(),
        frequency: parts[2].trim().to_string(),
        duration: parts[3].trim().to_string(),
        quantity,
    })
}

/// "test_type" or "test_type:notes"
pub fn parse_lab_request(value: &str) -> Result<LabRequest, String> {
    let mut parts = value.splitn(2, ':');
    let test_type = parts.next().unwrap_or("").trim().to_string();
    if test_type.is_empty() {
        return Err(format!("'{}' is not a valid lab request", value));
    }
    Ok(LabRequest {
        test_type,
        notes: parts.next().map(|n| n.trim().to_string()),
    })
}

/// "type:description:quantity:unit_price[:reference_id]"
pub fn parse_bill_item(value: &str) -> Result<NewBillItem, String> {
    let parts: Vec<&str> = value.splitn(5, ':').collect();
    if parts.len() < 4 {
        return Err(format!(
            "'{}' is not a valid bill item (expected type:description:quantity:unit_price[:reference_id])",
            value
        ));
    }
    let item_type: BillItemType = parts[0]
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid bill item type", parts[0]))?;
    let quantity = parts[2]
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("'{}' is not a valid quantity", parts[2]))?;
    let unit_price = parts[3]
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a valid price", parts[3]))?;
    let reference_id = match parts.get(4) {
        Some(raw) => Some(
            raw.trim()
                .parse::<i32>()
                .map_err(|_| format!("'{}' is not a valid reference id", raw))?,
        ),
        None => None,
    };
    Ok(NewBillItem {
        item_type,
        reference_id,
        description: parts[1].trim().to_string(),
        quantity,
        unit_price,
    })
}

/// Writes rendered document bytes to `output` (or a default file name) and
/// reports where they went.
pub fn write_document(output: Option<PathBuf>, default_name: &str, bytes: &[u8]) -> String {
    let path = output.unwrap_or_else(|| Path::new(default_name).to_path_buf());
    match std::fs::write(&path, bytes) {
        Ok(()) => format!("Written to {}.", path.display()),
        Err(e) => format!("Error: cannot write {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_a_full_medication_line() {
        let line = parse_medication_line("4:500mg:twice daily:7 days:14").unwrap();
        assert_eq!(line.medication_id, 4);
        assert_eq!(line.dosage, "500mg");
        assert_eq!(line.frequency, "twice daily");
        assert_eq!(line.duration, "7 days");
        assert_eq!(line.quantity, 14);
    }

    #[test]
    fn should_reject_short_medication_lines() {
        assert!(parse_medication_line("4:500mg:daily").is_err());
        assert!(parse_medication_line("x:500mg:daily:7 days:14").is_err());
    }

    #[test]
    fn should_parse_lab_requests_with_and_without_notes() {
        let plain = parse_lab_request("Throat culture").unwrap();
        assert_eq!(plain.test_type, "Throat culture");
        assert!(plain.notes.is_none());

        let with_notes = parse_lab_request("CBC:fasting sample").unwrap();
        assert_eq!(with_notes.notes.as_deref(), Some("fasting sample"));
    }

    #[test]
    fn should_parse_bill_items() {
        let item = parse_bill_item("medication:Amoxicillin 500mg:14:2.5:7").unwrap();
        assert_eq!(item.item_type, BillItemType::Medication);
        assert_eq!(item.quantity, 14);
        assert_eq!(item.unit_price, 2.5);
        assert_eq!(item.reference_id, Some(7));

        assert!(parse_bill_item("massage:desc:1:10").is_err());
        assert!(parse_bill_item("procedure:desc:one:10").is_err());
    }

    #[test]
    fn should_parse_dates_and_datetimes() {
        assert!(parse_date("2026-08-06").is_ok());
        assert!(parse_date("06/08/2026").is_err());
        assert!(parse_datetime("2026-08-06 14:30").is_ok());
        assert!(parse_datetime("2026-08-06").is_err());
    }
}
