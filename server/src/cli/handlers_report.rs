// server/src/cli/handlers_report.rs
use chrono::{Duration, NaiveDate, Utc};

use lib::commands::ReportCommand;

use crate::cli::cli::{AppState, NOT_LOGGED_IN};
use crate::cli::handlers_utils::parse_date;

pub async fn handle_report_command(action: ReportCommand, state: &AppState) -> String {
    let Some(ctx) = state.current_session().await else {
        return NOT_LOGGED_IN.to_string();
    };

    let (start, end) = match action {
        ReportCommand::Revenue { ref start, ref end }
        | ReportCommand::Appointments { ref start, ref end } => {
            match parse_range(start.as_deref(), end.as_deref()) {
                Ok(range) => range,
                Err(e) => return format!("Error: {}", e),
            }
        }
    };

    match action {
        ReportCommand::Revenue { .. } => state
            .dashboard
            .revenue_report(&ctx, start, end)
            .await
            .map(|report| {
                serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("Error: {}", e))
            })
            .unwrap_or_else(|e| format!("Error: {}", e)),
        ReportCommand::Appointments { .. } => state
            .dashboard
            .appointment_report(&ctx, start, end)
            .await
            .map(|report| {
                serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("Error: {}", e))
            })
            .unwrap_or_else(|e| format!("Error: {}", e)),
    }
}

/// Defaults to the trailing 30 days when no range is given.
fn parse_range(start: Option<&str>, end: Option<&str>) -> Result<(NaiveDate, NaiveDate), String> {
    let today = Utc::now().date_naive();
    let end = match end {
        Some(raw) => parse_date(raw)?,
        None => today,
    };
    let start = match start {
        Some(raw) => parse_date(raw)?,
        None => end - Duration::days(30),
    };
    Ok((start, end))
}
