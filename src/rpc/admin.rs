//! Administration backend: catalogue, orders, users/clients and reports.

use serde::{Deserialize, Serialize};

use super::{
    ActionByIdRequest, ClientRequest, Empty, GetBaseModelsRequest, OrderProduct,
    ProductArticleRequest, SharedChannel, rpc_methods,
};

/// Create or update a catalogue reference entry (brand, category, ...).
/// `base_model_name` selects the reference table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseModelRequest {
    pub base_model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBaseModelRequest {
    pub base_model_name: String,
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRequest {
    pub article: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrdersByStatusRequest {
    pub status_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub client_id: i64,
    pub status_id: i64,
    #[serde(default)]
    pub products: Vec<OrderProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role_id: i64,
    #[serde(default)]
    pub is_archived: bool,
}

/// Reporting window: today, yesterday, week, month or year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub period: String,
}

#[derive(Clone)]
pub struct AdminClient {
    channel: SharedChannel,
}

impl AdminClient {
    pub fn new(channel: SharedChannel) -> Self {
        Self { channel }
    }

    rpc_methods!("api.admin.ProductService" => {
        fn create_or_update_base_model(BaseModelRequest) = "CreateOrUpdateBaseModel";
        fn get_all_base_models(GetBaseModelsRequest) = "GetAllBaseModels";
        fn delete_base_model(DeleteBaseModelRequest) = "DeleteBaseModel";
        fn create_or_update_product(ProductRequest) = "CreateOrUpdateProduct";
        fn get_product_by_article(ProductArticleRequest) = "GetProductByArticle";
        fn get_products(Empty) = "GetProducts";
        fn delete_product(ProductArticleRequest) = "DeleteProduct";
    });

    rpc_methods!("api.admin.OrderService" => {
        fn get_order_statuses(Empty) = "GetOrderStatuses";
        fn get_order_clients(Empty) = "GetOrderClients";
        fn get_order_products(Empty) = "GetOrderProducts";
        fn get_orders(OrdersByStatusRequest) = "GetOrders";
        fn create_or_update_order(OrderRequest) = "CreateOrUpdateOrder";
        fn get_order_by_id(ActionByIdRequest) = "GetOrderById";
        fn delete_order(ActionByIdRequest) = "DeleteOrder";
    });

    rpc_methods!("api.admin.ClientService" => {
        fn get_users(Empty) = "GetUsers";
        fn get_roles(Empty) = "GetRoles";
        fn create_or_update_user(UserRequest) = "CreateOrUpdateUser";
        fn delete_user(ActionByIdRequest) = "DeleteUser";
        fn create_client(ClientRequest) = "CreateClient";
        fn get_clients(Empty) = "GetClients";
        fn delete_client(ActionByIdRequest) = "DeleteClient";
    });

    rpc_methods!("api.admin.ReportService" => {
        fn get_amount_of_orders_by_time_of_day(ReportRequest) = "GetAmountOfOrdersByTimeOfDay";
        fn get_purchases_by_brands(ReportRequest) = "GetPurchasesByBrands";
        fn get_average_order_processing_time(ReportRequest) = "GetAverageOrderProcessingTime";
    });
}
