use axum::{
    Router,
    routing::{delete, get, patch},
};

use std::sync::Arc;
use std::time::Duration;

use crate::{activity, contributions, expenses, members, settlement, summary, trips};
use engine::Engine;

/// Settings for the upstream text-generation API backing the trip summary
/// endpoint. When absent the endpoint answers 502.
#[derive(Clone, Debug)]
pub struct AiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub http: reqwest::Client,
    pub ai: Option<AiSettings>,
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/trips", get(trips::list).post(trips::create))
        .route(
            "/trips/{trip_id}",
            get(trips::get).patch(trips::update).delete(trips::remove),
        )
        .route(
            "/trips/{trip_id}/members",
            get(members::list).post(members::create),
        )
        .route(
            "/trips/{trip_id}/members/{member_id}",
            delete(members::remove),
        )
        .route(
            "/trips/{trip_id}/expenses",
            get(expenses::list).post(expenses::create),
        )
        .route(
            "/trips/{trip_id}/expenses/{expense_id}",
            patch(expenses::update).delete(expenses::remove),
        )
        .route(
            "/trips/{trip_id}/contributions",
            get(contributions::list).post(contributions::create),
        )
        .route(
            "/trips/{trip_id}/contributions/{contribution_id}",
            delete(contributions::remove),
        )
        .route("/trips/{trip_id}/pool", get(contributions::pool))
        .route("/trips/{trip_id}/settlement", get(settlement::get))
        .route("/trips/{trip_id}/activity", get(activity::list))
        .route("/trips/{trip_id}/summary/ai", get(summary::generate))
        .with_state(state)
}

pub async fn run(engine: Engine, ai: Option<AiSettings>) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, ai, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    ai: Option<AiSettings>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        http: reqwest::Client::new(),
        ai,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    ai: Option<AiSettings>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, ai, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::Database;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn app() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let state = ServerState {
            engine: Arc::new(Engine::builder().database(db).build()),
            http: reqwest::Client::new(),
            ai: None,
        };
        router(state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn trip_expense_settlement_flow() {
        let app = app().await;

        let (status, trip) = send(
            &app,
            "POST",
            "/trips",
            Some(json!({
                "name": "Goa",
                "members": [{ "name": "Jeevan" }, { "name": "Nagesh" }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let trip_id = trip["id"].as_str().unwrap().to_string();
        assert!(trip["startDate"].is_string());

        let (status, members) = send(&app, "GET", &format!("/trips/{trip_id}/members"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(members.as_array().unwrap().len(), 2);
        let payer = members[0]["id"].as_str().unwrap();

        let (status, expense) = send(
            &app,
            "POST",
            &format!("/trips/{trip_id}/expenses"),
            Some(json!({
                "description": "dinner",
                "amount": 400.0,
                "category": "Food",
                "paidBy": payer,
                "splitType": "equal"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(expense["splitType"], "equal");
        assert_eq!(expense["splits"].as_array().unwrap().len(), 2);

        let (status, settlement) =
            send(&app, "GET", &format!("/trips/{trip_id}/settlement"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settlement["ledger"].as_array().unwrap().len(), 2);
        assert_eq!(settlement["transactions"][0]["from"], "Nagesh");
        assert_eq!(settlement["transactions"][0]["to"], "Jeevan");
        assert_eq!(settlement["transactions"][0]["amount"], 200.0);
        assert_eq!(settlement["totals"]["totalExpense"], 400.0);
        assert_eq!(settlement["totals"]["categoryWise"]["Food"], 400.0);
    }

    #[tokio::test]
    async fn unknown_trip_answers_404() {
        let app = app().await;
        let (status, body) = send(
            &app,
            "GET",
            "/trips/00000000-0000-0000-0000-000000000000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn duplicate_member_answers_409() {
        let app = app().await;
        let (_, trip) = send(
            &app,
            "POST",
            "/trips",
            Some(json!({ "name": "Goa", "members": [{ "name": "Alice" }] })),
        )
        .await;
        let trip_id = trip["id"].as_str().unwrap();

        let (status, _) = send(
            &app,
            "POST",
            &format!("/trips/{trip_id}/members"),
            Some(json!({ "name": "alice" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn expense_without_amount_answers_422() {
        let app = app().await;
        let (_, trip) = send(
            &app,
            "POST",
            "/trips",
            Some(json!({ "name": "Goa", "members": [{ "name": "Alice" }] })),
        )
        .await;
        let trip_id = trip["id"].as_str().unwrap();
        let payer = {
            let (_, members) =
                send(&app, "GET", &format!("/trips/{trip_id}/members"), None).await;
            members[0]["id"].as_str().unwrap().to_string()
        };

        let (status, body) = send(
            &app,
            "POST",
            &format!("/trips/{trip_id}/expenses"),
            Some(json!({
                "description": "dinner",
                "paidBy": payer,
                "splitType": "equal"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Invalid amount: amount is required");
    }

    #[tokio::test]
    async fn summary_without_upstream_answers_502() {
        let app = app().await;
        let (_, trip) = send(&app, "POST", "/trips", Some(json!({ "name": "Goa" }))).await;
        let trip_id = trip["id"].as_str().unwrap();

        let (status, _) = send(&app, "GET", &format!("/trips/{trip_id}/summary/ai"), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn member_removal_conflict_answers_409() {
        let app = app().await;
        let (_, trip) = send(
            &app,
            "POST",
            "/trips",
            Some(json!({ "name": "Goa", "members": [{ "name": "Alice" }, { "name": "Bob" }] })),
        )
        .await;
        let trip_id = trip["id"].as_str().unwrap();
        let (_, members) = send(&app, "GET", &format!("/trips/{trip_id}/members"), None).await;
        let alice = members[0]["id"].as_str().unwrap().to_string();
        let bob = members[1]["id"].as_str().unwrap().to_string();

        send(
            &app,
            "POST",
            &format!("/trips/{trip_id}/expenses"),
            Some(json!({
                "description": "snacks",
                "amount": 80.0,
                "paidBy": alice,
                "splitType": "selected",
                "selectedMembers": [alice]
            })),
        )
        .await;

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/trips/{trip_id}/members/{alice}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Bob is in neither the splits nor the payer seat.
        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/trips/{trip_id}/members/{bob}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
