//! Activity feed API endpoint

use api_types::activity::ActivityView;
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

/// Most recent feed entries, newest first.
pub async fn list(
    State(state): State<ServerState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<ActivityView>>, ServerError> {
    let feed = state.engine.activity(trip_id).await?;
    Ok(Json(
        feed.into_iter()
            .map(|entry| ActivityView {
                id: entry.id,
                message: entry.message,
                timestamp: entry.timestamp,
            })
            .collect(),
    ))
}
