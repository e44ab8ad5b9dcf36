//! AI trip summary endpoint
//!
//! Builds a structured prompt from the trip snapshot and asks an upstream
//! text-generation API to explain the settlement in plain language. The
//! upstream never does the math; the prompt carries every computed figure.

use std::collections::HashMap;

use api_types::summary::{AiSummaryResponse, TripStats};
use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::json;
use uuid::Uuid;

use engine::{Expense, Member, Settlement, SplitType, Trip, format_amount};

use crate::{ServerError, server::ServerState};

pub async fn generate(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<AiSummaryResponse>, ServerError> {
    let Some(ai) = state.ai.clone() else {
        return Err(ServerError::Upstream("summary API not configured".to_string()));
    };

    let trip = state.engine.trip(trip_id).await?;
    let members = state.engine.members(trip_id).await?;
    if members.is_empty() {
        return Err(ServerError::Generic(
            "no members in this trip yet".to_string(),
        ));
    }
    let expenses = state.engine.expenses(trip_id).await?;
    if expenses.is_empty() {
        return Err(ServerError::Generic(
            "no expenses in this trip yet".to_string(),
        ));
    }
    let (settlement, totals) = state.engine.settlement(trip_id).await?;

    let prompt = build_prompt(&trip, &members, &expenses, &settlement);

    let body = json!({
        "contents": [{ "parts": [{ "text": prompt }] }]
    });
    let response = state
        .http
        .post(&ai.endpoint)
        .query(&[("key", ai.api_key.as_str())])
        .timeout(ai.timeout)
        .json(&body)
        .send()
        .await
        .map_err(|err| ServerError::Upstream(err.to_string()))?;
    if !response.status().is_success() {
        return Err(ServerError::Upstream(format!(
            "summary API answered {}",
            response.status()
        )));
    }
    let payload: serde_json::Value = response
        .json()
        .await
        .map_err(|err| ServerError::Upstream(err.to_string()))?;
    let summary = payload["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or_else(|| ServerError::Upstream("summary API returned no text".to_string()))?
        .to_string();

    Ok(Json(AiSummaryResponse {
        summary,
        trip: TripStats {
            name: trip.name,
            total_expense: totals.total_expense,
            member_count: members.len(),
            expense_count: expenses.len(),
        },
    }))
}

/// Renders the full explanation prompt from an already-computed settlement.
fn build_prompt(
    trip: &Trip,
    members: &[Member],
    expenses: &[Expense],
    settlement: &Settlement,
) -> String {
    let names: HashMap<Uuid, &str> = members
        .iter()
        .map(|member| (member.id, member.name.as_str()))
        .collect();

    let member_lines = members
        .iter()
        .enumerate()
        .map(|(i, member)| format!("{}. {}", i + 1, member.name))
        .collect::<Vec<_>>()
        .join("\n");

    let expense_blocks = expenses
        .iter()
        .enumerate()
        .map(|(i, expense)| {
            let split_details = if expense.splits.is_empty() {
                "  - No splits defined".to_string()
            } else {
                expense
                    .splits
                    .iter()
                    .map(|split| {
                        let member_name = names.get(&split.member).copied().unwrap_or("Unknown");
                        if expense.split_type == SplitType::Percentage {
                            format!(
                                "  - {member_name}: {}% (₹{})",
                                split.percentage.unwrap_or_default(),
                                format_amount(split.amount)
                            )
                        } else {
                            format!("  - {member_name}: ₹{}", format_amount(split.amount))
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            let paid_by = expense
                .paid_by
                .and_then(|id| names.get(&id).copied())
                .unwrap_or("Unknown");
            format!(
                "Expense {}: {}\n  Amount: ₹{}\n  Category: {}\n  Date: {}\n  Paid by: {}\n  Split Type: {}\n  Split Details:\n{}",
                i + 1,
                expense.description,
                format_amount(expense.amount),
                expense.category.as_str(),
                expense.date.format("%Y-%m-%d"),
                paid_by,
                expense.split_type.as_str(),
                split_details,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let ledger_blocks = settlement
        .ledger
        .iter()
        .map(|entry| {
            let direction = if entry.balance >= 0.0 {
                "(should receive)"
            } else {
                "(owes)"
            };
            format!(
                "{}:\n  - Total Paid: ₹{}\n  - Total Share: ₹{}\n  - Balance: ₹{} {}",
                entry.member.name,
                format_amount(entry.paid),
                format_amount(entry.share),
                format_amount(entry.balance),
                direction,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let transaction_lines = if settlement.transactions.is_empty() {
        "All expenses are already settled! No payments needed.".to_string()
    } else {
        settlement
            .transactions
            .iter()
            .enumerate()
            .map(|(i, tx)| {
                format!("{}. {} -> {}: ₹{}", i + 1, tx.from, tx.to, format_amount(tx.amount))
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are an expert financial analyst explaining trip expense settlements in a clear, friendly manner.\n\
\n\
## TRIP INFORMATION\n\
Trip Name: {trip_name}\n\
Start Date: {start_date}\n\
Total Members: {member_count}\n\
\n\
## MEMBERS\n\
{member_lines}\n\
\n\
## EXPENSES BREAKDOWN\n\
{expense_blocks}\n\
\n\
## CALCULATED SETTLEMENT DATA\n\
{ledger_blocks}\n\
\n\
## FINAL TRANSACTIONS (Optimized Settlement)\n\
{transaction_lines}\n\
\n\
---\n\
\n\
## YOUR TASK:\n\
Explain this trip's expense settlement. DO NOT recalculate the math - just EXPLAIN the calculations that have already been done.\n\
\n\
Generate your explanation with these sections:\n\
\n\
### 1. **Expense Breakdown**\n\
Explain each expense, who paid, and how it was split.\n\
\n\
### 2. **Each Person's Share**\n\
Show what each member paid vs what they owe.\n\
\n\
### 3. **Balances (Give / Take)**\n\
List who should receive money and who owes money.\n\
\n\
### 4. **Debt Cancellation** (if applicable)\n\
Explain how mutual debts cancel each other out.\n\
\n\
### 5. **Final Settlement Steps**\n\
List the optimized payment instructions.\n\
\n\
### 6. **Easy-to-read Summary Paragraph**\n\
A friendly 2-3 sentence summary in plain English.\n\
\n\
---\n\
\n\
IMPORTANT:\n\
- Use the EXACT calculations provided (do not recalculate)\n\
- Explain the logic clearly\n\
- Use simple, friendly language\n\
- Format with clear sections and bullet points\n\
- Use ₹ symbol for currency\n\
- Be concise but thorough",
        trip_name = trip.name,
        start_date = trip.start_date.format("%Y-%m-%d"),
        member_count = members.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{Category, PaymentSource, SplitSpec, compute_settlement};

    #[test]
    fn prompt_carries_every_computed_section() {
        let trip = Trip::new("Goa".to_string(), None);
        let members: Vec<Member> = ["Jeevan", "Nagesh"]
            .iter()
            .map(|name| Member::new(trip.id, name.to_string(), None, None))
            .collect();
        let member_ids: Vec<Uuid> = members.iter().map(|member| member.id).collect();

        let mut expense = engine::Expense::new(
            trip.id,
            "dinner".to_string(),
            400.0,
            Category::Food,
            chrono::Utc::now(),
            Some(member_ids[0]),
            SplitType::Equal,
            PaymentSource::Member,
        )
        .unwrap();
        expense.splits =
            engine::allocate_splits(400.0, &SplitSpec::Equal, &member_ids).unwrap();
        let expenses = vec![expense];

        let settlement = compute_settlement(&members, &expenses);
        let prompt = build_prompt(&trip, &members, &expenses, &settlement);

        assert!(prompt.contains("Trip Name: Goa"));
        assert!(prompt.contains("Total Members: 2"));
        assert!(prompt.contains("Expense 1: dinner"));
        assert!(prompt.contains("Amount: ₹400.00"));
        assert!(prompt.contains("Paid by: Jeevan"));
        assert!(prompt.contains("- Total Paid: ₹400.00"));
        assert!(prompt.contains("1. Nagesh -> Jeevan: ₹200.00"));
        assert!(prompt.contains("DO NOT recalculate"));
    }
}
