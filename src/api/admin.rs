//! Administration dispatcher. Mounted under `/admin`, admin role only.

use axum::{
    Router,
    extract::State,
    routing::{delete, get, post},
};

use super::envelope::{ApiResult, JsonBody, PathParams, ResultExt, ok};
use crate::auth::Caller;
use crate::rpc::admin::{
    AdminClient, BaseModelRequest, DeleteBaseModelRequest, OrderRequest, OrdersByStatusRequest,
    ProductRequest, ReportRequest, UserRequest,
};
use crate::rpc::{ActionByIdRequest, ClientRequest, Empty, GetBaseModelsRequest, ProductArticleRequest};

pub fn router(admin: AdminClient) -> Router {
    Router::new()
        .route("/product/base-model", post(create_or_update_base_model))
        .route("/product/base-models/{base_model_name}", get(get_all_base_models))
        .route(
            "/product/base-model/{base_model_name}/{id}",
            delete(delete_base_model),
        )
        .route("/product", post(create_or_update_product).get(get_products))
        .route(
            "/product/{article}",
            get(get_product_by_article).delete(delete_product),
        )
        .route("/order/statuses", get(get_order_statuses))
        .route("/order/clients", get(get_order_clients))
        .route("/order/products", get(get_order_products))
        .route("/order/status/{status_id}", get(get_orders))
        .route("/orders/status/{status_id}", get(get_orders))
        .route("/order", post(create_or_update_order))
        .route("/order/{id}", get(get_order_by_id).delete(delete_order))
        .route("/client/users", get(get_users))
        .route("/client/roles", get(get_roles))
        .route("/client/user", post(create_or_update_user))
        .route("/client/user/{id}", delete(delete_user))
        .route("/client", post(create_client).get(get_clients))
        .route("/client/{id}", delete(delete_client))
        .route("/report/orders-by-time/{period}", get(orders_by_time_of_day))
        .route("/report/purchases-by-brands/{period}", get(purchases_by_brands))
        .route(
            "/report/average-processing-time/{period}",
            get(average_processing_time),
        )
        .with_state(admin)
}

// Product

async fn create_or_update_base_model(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    JsonBody(body): JsonBody<BaseModelRequest>,
) -> ApiResult {
    ok(admin
        .create_or_update_base_model(&ctx, &body)
        .await
        .or_fail("failed to save base model")?)
}

async fn get_all_base_models(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    PathParams(base_model_name): PathParams<String>,
) -> ApiResult {
    let request = GetBaseModelsRequest { base_model_name };
    ok(admin
        .get_all_base_models(&ctx, &request)
        .await
        .or_fail("failed to load base models")?)
}

async fn delete_base_model(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    PathParams((base_model_name, id)): PathParams<(String, i64)>,
) -> ApiResult {
    let request = DeleteBaseModelRequest { base_model_name, id };
    ok(admin
        .delete_base_model(&ctx, &request)
        .await
        .or_fail("failed to delete base model")?)
}

async fn create_or_update_product(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    JsonBody(body): JsonBody<ProductRequest>,
) -> ApiResult {
    ok(admin
        .create_or_update_product(&ctx, &body)
        .await
        .or_fail("failed to save product")?)
}

async fn get_product_by_article(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    PathParams(article): PathParams<String>,
) -> ApiResult {
    ok(admin
        .get_product_by_article(&ctx, &ProductArticleRequest { article })
        .await
        .or_fail("failed to load product")?)
}

async fn get_products(State(admin): State<AdminClient>, Caller(ctx): Caller) -> ApiResult {
    ok(admin
        .get_products(&ctx, &Empty {})
        .await
        .or_fail("failed to load products")?)
}

async fn delete_product(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    PathParams(article): PathParams<String>,
) -> ApiResult {
    ok(admin
        .delete_product(&ctx, &ProductArticleRequest { article })
        .await
        .or_fail("failed to delete product")?)
}

// Order

async fn get_order_statuses(State(admin): State<AdminClient>, Caller(ctx): Caller) -> ApiResult {
    ok(admin
        .get_order_statuses(&ctx, &Empty {})
        .await
        .or_fail("failed to load order statuses")?)
}

async fn get_order_clients(State(admin): State<AdminClient>, Caller(ctx): Caller) -> ApiResult {
    ok(admin
        .get_order_clients(&ctx, &Empty {})
        .await
        .or_fail("failed to load order clients")?)
}

async fn get_order_products(State(admin): State<AdminClient>, Caller(ctx): Caller) -> ApiResult {
    ok(admin
        .get_order_products(&ctx, &Empty {})
        .await
        .or_fail("failed to load order products")?)
}

async fn get_orders(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    PathParams(status_id): PathParams<i64>,
) -> ApiResult {
    ok(admin
        .get_orders(&ctx, &OrdersByStatusRequest { status_id })
        .await
        .or_fail("failed to load orders")?)
}

async fn create_or_update_order(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    JsonBody(body): JsonBody<OrderRequest>,
) -> ApiResult {
    ok(admin
        .create_or_update_order(&ctx, &body)
        .await
        .or_fail("failed to save order")?)
}

async fn get_order_by_id(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    PathParams(id): PathParams<i64>,
) -> ApiResult {
    ok(admin
        .get_order_by_id(&ctx, &ActionByIdRequest { id })
        .await
        .or_fail("failed to load order")?)
}

async fn delete_order(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    PathParams(id): PathParams<i64>,
) -> ApiResult {
    ok(admin
        .delete_order(&ctx, &ActionByIdRequest { id })
        .await
        .or_fail("failed to delete order")?)
}

// Users and clients

async fn get_users(State(admin): State<AdminClient>, Caller(ctx): Caller) -> ApiResult {
    ok(admin
        .get_users(&ctx, &Empty {})
        .await
        .or_fail("failed to load users")?)
}

async fn get_roles(State(admin): State<AdminClient>, Caller(ctx): Caller) -> ApiResult {
    ok(admin
        .get_roles(&ctx, &Empty {})
        .await
        .or_fail("failed to load roles")?)
}

async fn create_or_update_user(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    JsonBody(body): JsonBody<UserRequest>,
) -> ApiResult {
    ok(admin
        .create_or_update_user(&ctx, &body)
        .await
        .or_fail("failed to save user")?)
}

async fn delete_user(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    PathParams(id): PathParams<i64>,
) -> ApiResult {
    ok(admin
        .delete_user(&ctx, &ActionByIdRequest { id })
        .await
        .or_fail("failed to delete user")?)
}

async fn create_client(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    JsonBody(body): JsonBody<ClientRequest>,
) -> ApiResult {
    ok(admin
        .create_client(&ctx, &body)
        .await
        .or_fail("failed to create client")?)
}

async fn get_clients(State(admin): State<AdminClient>, Caller(ctx): Caller) -> ApiResult {
    ok(admin
        .get_clients(&ctx, &Empty {})
        .await
        .or_fail("failed to load clients")?)
}

async fn delete_client(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    PathParams(id): PathParams<i64>,
) -> ApiResult {
    ok(admin
        .delete_client(&ctx, &ActionByIdRequest { id })
        .await
        .or_fail("failed to delete client")?)
}

// Reports

async fn orders_by_time_of_day(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    PathParams(period): PathParams<String>,
) -> ApiResult {
    ok(admin
        .get_amount_of_orders_by_time_of_day(&ctx, &ReportRequest { period })
        .await
        .or_fail("failed to build report")?)
}

async fn purchases_by_brands(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    PathParams(period): PathParams<String>,
) -> ApiResult {
    ok(admin
        .get_purchases_by_brands(&ctx, &ReportRequest { period })
        .await
        .or_fail("failed to build report")?)
}

async fn average_processing_time(
    State(admin): State<AdminClient>,
    Caller(ctx): Caller,
    PathParams(period): PathParams<String>,
) -> ApiResult {
    ok(admin
        .get_average_order_processing_time(&ctx, &ReportRequest { period })
        .await
        .or_fail("failed to build report")?)
}
