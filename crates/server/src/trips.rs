//! Trip API endpoints

use api_types::trip::{TripNew, TripUpdate, TripView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn view(trip: engine::Trip) -> TripView {
    TripView {
        id: trip.id,
        name: trip.name,
        start_date: trip.start_date,
        created_at: trip.created_at,
    }
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<TripView>>, ServerError> {
    let trips = state.engine.trips().await?;
    Ok(Json(trips.into_iter().map(view).collect()))
}

/// Handle requests for creating a new trip, optionally with members.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TripNew>,
) -> Result<Json<TripView>, ServerError> {
    let members = payload
        .members
        .unwrap_or_default()
        .into_iter()
        .map(|member| engine::NewMember {
            name: member.name,
            contact: member.contact,
            avatar: member.avatar,
        })
        .collect();
    let trip = state
        .engine
        .new_trip(&payload.name, payload.start_date, members)
        .await?;
    Ok(Json(view(trip)))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<TripView>, ServerError> {
    let trip = state.engine.trip(trip_id).await?;
    Ok(Json(view(trip)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<TripUpdate>,
) -> Result<Json<TripView>, ServerError> {
    let trip = state
        .engine
        .update_trip(trip_id, payload.name.as_deref(), payload.start_date)
        .await?;
    Ok(Json(view(trip)))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_trip(trip_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
