use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{AiSettings, ServerState, run, run_with_listener, spawn_with_listener};

mod activity;
mod contributions;
mod expenses;
mod members;
mod server;
mod settlement;
mod summary;
mod trips;

pub mod types {
    pub mod trip {
        pub use api_types::trip::{TripNew, TripUpdate, TripView};
    }

    pub mod member {
        pub use api_types::member::{MemberNew, MemberView};
    }

    pub mod expense {
        pub use api_types::expense::{
            CustomSplit, ExpenseNew, ExpenseUpdate, ExpenseView, PercentShare, SplitView,
        };
    }

    pub mod contribution {
        pub use api_types::contribution::{ContributionNew, ContributionView};
    }

    pub mod settlement {
        pub use api_types::settlement::{
            LedgerEntryView, MemberRef, SettlementResponse, TotalsView, TransferView,
        };
    }

    pub mod pool {
        pub use api_types::pool::{ContributorView, PoolSummaryResponse};
    }

    pub mod activity {
        pub use api_types::activity::ActivityView;
    }

    pub mod summary {
        pub use api_types::summary::{AiSummaryResponse, TripStats};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    /// The upstream text-generation API failed or timed out.
    Upstream(String),
}

//TODO: Find a better solution
#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::MemberInUse(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidName(_) | EngineError::InvalidAmount(_) | EngineError::InvalidSplit(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Upstream(err) => {
                tracing::error!("upstream summary error: {err}");
                (StatusCode::BAD_GATEWAY, "summary service unavailable".to_string())
            }
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res = ServerError::from(EngineError::MemberInUse("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res = ServerError::from(EngineError::InvalidSplit("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res = ServerError::from(EngineError::InvalidName("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_maps_to_502() {
        let res = ServerError::Upstream("boom".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }
}
