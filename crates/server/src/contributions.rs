//! Pool contribution API endpoints

use api_types::contribution::{ContributionNew, ContributionView};
use api_types::pool::{ContributorView, PoolSummaryResponse};
use api_types::settlement::MemberRef;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn view(contribution: engine::Contribution, member: engine::Member) -> ContributionView {
    ContributionView {
        id: contribution.id,
        member_id: contribution.member_id,
        member_name: member.name,
        amount: contribution.amount,
        date: contribution.date,
        notes: contribution.notes,
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<ContributionView>>, ServerError> {
    let contributions = state.engine.contributions(trip_id).await?;
    Ok(Json(
        contributions
            .into_iter()
            .map(|(contribution, member)| view(contribution, member))
            .collect(),
    ))
}

pub async fn create(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<ContributionNew>,
) -> Result<Json<ContributionView>, ServerError> {
    let contribution = state
        .engine
        .add_contribution(
            trip_id,
            payload.member_id,
            payload.amount,
            payload.date,
            payload.notes,
        )
        .await?;
    let member_name = state
        .engine
        .members(trip_id)
        .await?
        .into_iter()
        .find(|member| member.id == contribution.member_id)
        .map(|member| member.name)
        .unwrap_or_default();
    Ok(Json(ContributionView {
        id: contribution.id,
        member_id: contribution.member_id,
        member_name,
        amount: contribution.amount,
        date: contribution.date,
        notes: contribution.notes,
    }))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path((trip_id, contribution_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_contribution(trip_id, contribution_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pool totals with the proportional return each contributor would get.
pub async fn pool(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<PoolSummaryResponse>, ServerError> {
    let summary = state.engine.pool_summary(trip_id).await?;
    Ok(Json(PoolSummaryResponse {
        total_contributions: summary.total_contributions,
        total_spent_from_pool: summary.total_spent_from_pool,
        remaining_balance: summary.remaining_balance,
        contributors: summary
            .contributors
            .into_iter()
            .map(|contributor| ContributorView {
                member: MemberRef {
                    id: contributor.member.id,
                    name: contributor.member.name,
                },
                contributed: contributor.contributed,
                return_amount: contributor.return_amount,
            })
            .collect(),
        contribution_count: summary.contribution_count,
        expense_count: summary.expense_count,
    }))
}
