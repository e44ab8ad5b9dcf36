//! Member API endpoints

use api_types::member::{MemberNew, MemberView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn view(member: engine::Member) -> MemberView {
    MemberView {
        id: member.id,
        name: member.name,
        contact: member.contact,
        avatar: member.avatar,
        created_at: member.created_at,
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<MemberView>>, ServerError> {
    let members = state.engine.members(trip_id).await?;
    Ok(Json(members.into_iter().map(view).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<MemberNew>,
) -> Result<Json<MemberView>, ServerError> {
    let member = state
        .engine
        .add_member(trip_id, &payload.name, payload.contact, payload.avatar)
        .await?;
    Ok(Json(view(member)))
}

/// Refused with 409 while the member is still referenced by any expense.
pub async fn remove(
    State(state): State<ServerState>,
    Path((trip_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state.engine.remove_member(trip_id, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
