//! Fulfillment dispatcher. Mounted under `/manager`, manager role only.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};

use super::envelope::{ApiResult, JsonBody, PathParams, ResultExt, ok};
use crate::auth::Caller;
use crate::rpc::manager::{ManagerClient, PaidOrderRequest};
use crate::rpc::{ActionByIdRequest, Empty};

pub fn router(manager: ManagerClient) -> Router {
    Router::new()
        .route("/order", get(get_all_orders))
        .route("/orders", get(get_all_orders))
        .route("/order/give", post(give_order))
        .route("/order/{id}", get(get_order_by_id))
        .route("/order/{id}/cancel", post(cancel_order))
        .with_state(manager)
}

async fn get_all_orders(State(manager): State<ManagerClient>, Caller(ctx): Caller) -> ApiResult {
    ok(manager
        .get_all_orders(&ctx, &Empty {})
        .await
        .or_fail("failed to load orders")?)
}

async fn get_order_by_id(
    State(manager): State<ManagerClient>,
    Caller(ctx): Caller,
    PathParams(id): PathParams<i64>,
) -> ApiResult {
    ok(manager
        .get_order_by_id(&ctx, &ActionByIdRequest { id })
        .await
        .or_fail("failed to load order")?)
}

async fn give_order(
    State(manager): State<ManagerClient>,
    Caller(ctx): Caller,
    JsonBody(body): JsonBody<PaidOrderRequest>,
) -> ApiResult {
    ok(manager
        .give_order(&ctx, &body)
        .await
        .or_fail("failed to hand over order")?)
}

async fn cancel_order(
    State(manager): State<ManagerClient>,
    Caller(ctx): Caller,
    PathParams(id): PathParams<i64>,
) -> ApiResult {
    ok(manager
        .cancel_order(&ctx, &ActionByIdRequest { id })
        .await
        .or_fail("failed to cancel order")?)
}
