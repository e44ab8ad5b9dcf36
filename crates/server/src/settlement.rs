//! Settlement API endpoint

use api_types::settlement::{
    LedgerEntryView, MemberRef, SettlementResponse, TotalsView, TransferView,
};
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

/// Ledger, simplified transfers, and expense totals for one trip.
pub async fn get(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<SettlementResponse>, ServerError> {
    let (settlement, totals) = state.engine.settlement(trip_id).await?;
    Ok(Json(SettlementResponse {
        ledger: settlement
            .ledger
            .into_iter()
            .map(|entry| LedgerEntryView {
                member: MemberRef {
                    id: entry.member.id,
                    name: entry.member.name,
                },
                paid: entry.paid,
                share: entry.share,
                balance: entry.balance,
            })
            .collect(),
        transactions: settlement
            .transactions
            .into_iter()
            .map(|transfer| TransferView {
                from: transfer.from,
                to: transfer.to,
                amount: transfer.amount,
            })
            .collect(),
        totals: TotalsView {
            total_expense: totals.total_expense,
            category_wise: totals.category_wise,
        },
    }))
}
