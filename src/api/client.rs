//! Customer dispatcher. Mounted under `/client`, client role only.

use axum::{
    Router,
    extract::State,
    routing::{delete, get, post},
};

use super::envelope::{ApiResult, JsonBody, PathParams, QueryParams, ResultExt, ok};
use crate::auth::Caller;
use crate::rpc::customer::{
    CompleteOrderRequest, CreateOrderRequest, CustomerClient, GetProductsRequest,
    ProductIntoFavoritesRequest, ProductIntoOrderRequest,
};
use crate::rpc::{ActionByIdRequest, ClientRequest, Empty, GetBaseModelsRequest, ProductArticleRequest};

pub fn router(customers: CustomerClient) -> Router {
    Router::new()
        .route("/profile", post(fill_profile))
        .route("/profile/{id}", get(get_profile))
        .route("/{id}", delete(delete_client))
        .route("/product/base-models", get(get_all_base_models))
        .route("/product", get(get_products))
        .route("/product/favorites", get(get_favorite_products))
        .route("/product/{article}", get(get_product))
        .route("/product/{article}/favorites", post(toggle_favorite))
        .route("/order", post(create_order).get(get_orders))
        .route("/orders", get(get_orders))
        .route("/order/add-product", post(add_product_to_order))
        .route("/order/{id}", get(get_order_by_id))
        .route("/order/{id}/complete", post(complete_order))
        .route("/order/{id}/cancel", post(cancel_order))
        .with_state(customers)
}

async fn fill_profile(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
    JsonBody(mut body): JsonBody<ClientRequest>,
) -> ApiResult {
    // The profile always belongs to the caller.
    body.user_id = ctx.user_id;
    ok(customers
        .fill_client_profile(&ctx, &body)
        .await
        .or_fail("failed to save profile")?)
}

async fn get_profile(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
    PathParams(id): PathParams<i64>,
) -> ApiResult {
    ok(customers
        .get_client_profile(&ctx, &ActionByIdRequest { id })
        .await
        .or_fail("failed to load profile")?)
}

async fn delete_client(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
    PathParams(id): PathParams<i64>,
) -> ApiResult {
    ok(customers
        .delete_client(&ctx, &ActionByIdRequest { id })
        .await
        .or_fail("failed to delete client")?)
}

async fn get_all_base_models(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
    QueryParams(query): QueryParams<GetBaseModelsRequest>,
) -> ApiResult {
    ok(customers
        .get_all_base_models(&ctx, &query)
        .await
        .or_fail("failed to load base models")?)
}

async fn get_products(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
    QueryParams(query): QueryParams<GetProductsRequest>,
) -> ApiResult {
    ok(customers
        .get_products(&ctx, &query)
        .await
        .or_fail("failed to load products")?)
}

async fn get_product(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
    PathParams(article): PathParams<String>,
) -> ApiResult {
    ok(customers
        .get_product(&ctx, &ProductArticleRequest { article })
        .await
        .or_fail("failed to load product")?)
}

async fn toggle_favorite(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
    PathParams(article): PathParams<String>,
) -> ApiResult {
    ok(customers
        .action_product_to_favorites(&ctx, &ProductIntoFavoritesRequest { article })
        .await
        .or_fail("failed to update favorites")?)
}

async fn get_favorite_products(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
) -> ApiResult {
    ok(customers
        .get_favorite_products(&ctx, &Empty {})
        .await
        .or_fail("failed to load favorites")?)
}

async fn create_order(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
    JsonBody(body): JsonBody<CreateOrderRequest>,
) -> ApiResult {
    ok(customers
        .create_order(&ctx, &body)
        .await
        .or_fail("failed to create order")?)
}

async fn get_orders(State(customers): State<CustomerClient>, Caller(ctx): Caller) -> ApiResult {
    ok(customers
        .get_client_orders(&ctx, &Empty {})
        .await
        .or_fail("failed to load orders")?)
}

async fn add_product_to_order(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
    JsonBody(body): JsonBody<ProductIntoOrderRequest>,
) -> ApiResult {
    ok(customers
        .add_product_to_order(&ctx, &body)
        .await
        .or_fail("failed to add product to order")?)
}

async fn get_order_by_id(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
    PathParams(id): PathParams<i64>,
) -> ApiResult {
    ok(customers
        .get_order_by_id(&ctx, &ActionByIdRequest { id })
        .await
        .or_fail("failed to load order")?)
}

async fn complete_order(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
    PathParams(order_id): PathParams<i64>,
) -> ApiResult {
    ok(customers
        .complete_order(&ctx, &CompleteOrderRequest { order_id })
        .await
        .or_fail("failed to complete order")?)
}

async fn cancel_order(
    State(customers): State<CustomerClient>,
    Caller(ctx): Caller,
    PathParams(id): PathParams<i64>,
) -> ApiResult {
    ok(customers
        .cancel_order(&ctx, &ActionByIdRequest { id })
        .await
        .or_fail("failed to cancel order")?)
}
