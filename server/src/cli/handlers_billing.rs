// server/src/cli/handlers_billing.rs
use lib::commands::BillingCommand;
use models::medical::Bill;

use crate::cli::cli::{AppState, NOT_LOGGED_IN};
use crate::cli::handlers_utils::{parse_bill_item, write_document};

pub async fn handle_billing_command(action: BillingCommand, state: &AppState) -> String {
    let Some(ctx) = state.current_session().await else {
        return NOT_LOGGED_IN.to_string();
    };

    match action {
        BillingCommand::Create { patient_id, items } => {
            let mut parsed_items = Vec::with_capacity(items.len());
            for raw in &items {
                match parse_bill_item(raw) {
                    Ok(item) => parsed_items.push(item),
                    Err(e) => return format!("Error: {}", e),
                }
            }
            state
                .billing
                .create_bill(&ctx, patient_id, parsed_items)
                .await
                .map(|bill| {
                    format!(
                        "Bill {} created, total {:.2}.",
                        bill.id, bill.total_amount
                    )
                })
                .unwrap_or_else(|e| format!("Error: {}", e))
        }
        BillingCommand::View { bill_id } => match state.billing.get_bill(&ctx, bill_id).await {
            Ok(bill) => render_bill(&bill),
            Err(e) => format!("Error: {}", e),
        },
        BillingCommand::List => state
            .billing
            .list_bills(&ctx)
            .await
            .map(|bills| {
                if bills.is_empty() {
                    "No bills found.".to_string()
                } else {
                    bills
                        .iter()
                        .map(|b| {
                            format!(
                                "{:>4}  patient {:>4}  {:>10.2}  {}",
                                b.id, b.patient_id, b.total_amount, b.payment_status
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            })
            .unwrap_or_else(|e| format!("Error: {}", e)),
        BillingCommand::Pay { bill_id, method } => state
            .billing
            .mark_paid(&ctx, bill_id, method)
            .await
            .map(|_| "Bill marked as paid.".to_string())
            .unwrap_or_else(|e| format!("Error: {}", e)),
        BillingCommand::Cancel { bill_id } => state
            .billing
            .cancel_bill(&ctx, bill_id)
            .await
            .map(|_| "Bill cancelled.".to_string())
            .unwrap_or_else(|e| format!("Error: {}", e)),
        BillingCommand::Invoice { bill_id, output } => {
            match state.billing.generate_invoice(&ctx, bill_id).await {
                Ok(bytes) => write_document(output, &format!("invoice_{}.txt", bill_id), &bytes),
                Err(e) => format!("Error: {}", e),
            }
        }
    }
}

fn render_bill(bill: &Bill) -> String {
    let mut out = format!(
        "Bill #{}  patient {}  {}  {}\n",
        bill.id,
        bill.patient_id,
        bill.bill_date.format("%Y-%m-%d"),
        bill.payment_status
    );
    for item in &bill.items {
        out.push_str(&format!(
            "  {:<12} {:<30} {:>3} x {:>8.2} = {:>10.2}\n",
            item.item_type.to_string(),
            item.description,
            item.quantity,
            item.unit_price,
            item.total_price
        ));
    }
    out.push_str(&format!("  Total: {:.2}", bill.total_amount));
    out
}
