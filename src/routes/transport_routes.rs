use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::controllers::consolidation_controller::ConsolidationController;
use crate::controllers::order_controller::OrderController;
use crate::dto::consolidation_dto::{
    CostSplitData, CostSplitParams, MergeResultData, MergeTransportsRequest,
    RecalculateDistanceData, UnmergeResultData, UnmergeTransportRequest,
};
use crate::dto::order_dto::{ApiResponse, OrderResponse};
use crate::middleware::identity::Identity;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_transport_router() -> Router<AppState> {
    Router::new()
        .route("/merge", post(merge_transports))
        .route("/unmerge", post(unmerge_transport))
        .route("/cost-split", get(cost_split_preview))
        .route("/:id", get(get_transport))
        .route("/:id/recalculate-distance", post(recalculate_distance))
}

fn consolidation_controller(state: &AppState) -> ConsolidationController {
    ConsolidationController::new(state.pool.clone(), Arc::clone(&state.geodistance))
}

async fn merge_transports(
    State(state): State<AppState>,
    actor: Identity,
    Json(request): Json<MergeTransportsRequest>,
) -> Result<Json<ApiResponse<MergeResultData>>, AppError> {
    let controller = consolidation_controller(&state);
    let response = controller.merge(request, actor).await?;
    Ok(Json(response))
}

async fn unmerge_transport(
    State(state): State<AppState>,
    actor: Identity,
    Json(request): Json<UnmergeTransportRequest>,
) -> Result<Json<ApiResponse<UnmergeResultData>>, AppError> {
    let controller = consolidation_controller(&state);
    let response = controller.unmerge(request, actor).await?;
    Ok(Json(response))
}

async fn get_transport(
    State(state): State<AppState>,
    _actor: Identity,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, AppError> {
    let controller = OrderController::new(state.pool.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn recalculate_distance(
    State(state): State<AppState>,
    _actor: Identity,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<RecalculateDistanceData>>, AppError> {
    let controller = consolidation_controller(&state);
    let response = controller.recalculate_distance(id).await?;
    Ok(Json(response))
}

async fn cost_split_preview(
    State(state): State<AppState>,
    _actor: Identity,
    Query(params): Query<CostSplitParams>,
) -> Result<Json<ApiResponse<CostSplitData>>, AppError> {
    let controller = consolidation_controller(&state);
    let response = controller.cost_split(params)?;
    Ok(Json(response))
}
