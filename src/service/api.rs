use crate::{
    application::app::Application,
    domain::{
        errors::ViewStateError,
        models::{
            AddressLedger, CirculatingStats, GraphTransform, NetworkLink, NetworkNode,
            NodePosition, Snapshot, TimeSeries, Transaction,
        },
    },
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

pub fn router<A>(app: Arc<A>) -> Router
where
    A: Application + Send + Sync + 'static,
{
    Router::new()
        .route("/nodes", get(get_nodes::<A>))
        .route("/links", get(get_links::<A>))
        .route("/transactions", get(get_transactions::<A>))
        .route("/timeseries", get(get_time_series::<A>))
        .route("/days", get(get_days::<A>))
        .route("/days/index", get(get_day_index::<A>))
        .route("/days/nearest", get(get_nearest_day::<A>))
        .route("/days/:index/transactions", get(get_day_transactions::<A>))
        .route("/days/:index/balances", get(get_day_balances::<A>))
        .route("/addresses", get(get_addresses::<A>))
        .route("/stats", get(get_stats::<A>))
        .route(
            "/view-state/transform",
            get(get_transform::<A>).put(put_transform::<A>),
        )
        .route(
            "/view-state/positions",
            get(get_positions::<A>).put(put_positions::<A>),
        )
        .with_state(app)
        .layer(CorsLayer::permissive())
}

pub async fn start_server<A>(
    shutdown: broadcast::Sender<()>,
    app: Arc<A>,
    port: u16,
) -> anyhow::Result<()>
where
    A: Application + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;

    let server = axum::serve(listener, router(app));

    tracing::info!("API server started on port {}", port);

    let mut shutdown_rx = shutdown.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => {
            tracing::warn!("API server received shutdown signal");
        }
        _ = server => {
            tracing::warn!("API server stopped unexpectedly");
        }
    }

    Ok(())
}

fn view_state_status(err: ViewStateError) -> StatusCode {
    match err {
        ViewStateError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        ViewStateError::FailedToSerialize(e) => {
            tracing::error!("View state is not valid JSON: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn get_nodes<A: Application>(State(app_state): State<Arc<A>>) -> Json<Vec<NetworkNode>> {
    Json(app_state.network().await.nodes)
}

async fn get_links<A: Application>(State(app_state): State<Arc<A>>) -> Json<Vec<NetworkLink>> {
    Json(app_state.network().await.links)
}

async fn get_transactions<A: Application>(
    State(app_state): State<Arc<A>>,
) -> Json<Vec<Transaction>> {
    Json(app_state.transactions().await)
}

async fn get_time_series<A: Application>(State(app_state): State<Arc<A>>) -> Json<TimeSeries> {
    Json(app_state.time_series().await)
}

async fn get_days<A: Application>(State(app_state): State<Arc<A>>) -> Json<Vec<i64>> {
    Json(app_state.day_boundaries().await)
}

#[derive(Deserialize)]
struct TimeQuery {
    t: i64,
}

#[derive(Serialize)]
struct DayIndex {
    index: usize,
    timestamp: Option<i64>,
}

async fn get_day_index<A: Application>(
    State(app_state): State<Arc<A>>,
    Query(params): Query<TimeQuery>,
) -> Json<DayIndex> {
    let index = app_state.day_index_at_time(params.t).await;
    let timestamp = app_state.day_boundaries().await.get(index).copied();
    Json(DayIndex { index, timestamp })
}

#[derive(Deserialize)]
struct DateQuery {
    date: Option<String>,
}

#[derive(Serialize)]
struct NearestDay {
    timestamp: i64,
}

async fn get_nearest_day<A: Application>(
    State(app_state): State<Arc<A>>,
    Query(params): Query<DateQuery>,
) -> Json<NearestDay> {
    Json(NearestDay {
        timestamp: app_state.nearest_day(params.date).await,
    })
}

async fn get_day_transactions<A: Application>(
    State(app_state): State<Arc<A>>,
    Path(index): Path<usize>,
) -> Json<Vec<Transaction>> {
    Json(app_state.transactions_for_day(index).await)
}

async fn get_day_balances<A: Application>(
    State(app_state): State<Arc<A>>,
    Path(index): Path<usize>,
) -> Result<Json<Snapshot>, StatusCode> {
    app_state
        .balances_for_day(index)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_addresses<A: Application>(State(app_state): State<Arc<A>>) -> Json<AddressLedger> {
    Json(app_state.address_ledger().await)
}

async fn get_stats<A: Application>(
    State(app_state): State<Arc<A>>,
    Query(params): Query<TimeQuery>,
) -> Json<CirculatingStats> {
    Json(app_state.circulating_at(params.t).await)
}

async fn get_transform<A: Application>(
    State(app_state): State<Arc<A>>,
) -> Result<Json<GraphTransform>, StatusCode> {
    app_state
        .graph_transform()
        .await
        .map(Json)
        .map_err(view_state_status)
}

async fn put_transform<A: Application>(
    State(app_state): State<Arc<A>>,
    Json(transform): Json<GraphTransform>,
) -> Result<StatusCode, StatusCode> {
    app_state
        .save_graph_transform(transform)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(view_state_status)
}

async fn get_positions<A: Application>(
    State(app_state): State<Arc<A>>,
) -> Result<Json<HashMap<String, NodePosition>>, StatusCode> {
    app_state
        .node_positions()
        .await
        .map(Json)
        .map_err(view_state_status)
}

async fn put_positions<A: Application>(
    State(app_state): State<Arc<A>>,
    Json(positions): Json<HashMap<String, NodePosition>>,
) -> Result<StatusCode, StatusCode> {
    app_state
        .save_node_positions(positions)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(view_state_status)
}
