//! Customer-facing backend: client profiles, catalogue browsing, own orders.

use serde::{Deserialize, Serialize};

use super::{
    ActionByIdRequest, ClientRequest, Empty, GetBaseModelsRequest, OrderProduct,
    ProductArticleRequest, SharedChannel, rpc_methods,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetProductsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductIntoFavoritesRequest {
    pub article: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub products: Vec<OrderProduct>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompleteOrderRequest {
    pub order_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductIntoOrderRequest {
    pub order_id: i64,
    pub article: String,
    pub quantity: i32,
}

#[derive(Clone)]
pub struct CustomerClient {
    channel: SharedChannel,
}

impl CustomerClient {
    pub fn new(channel: SharedChannel) -> Self {
        Self { channel }
    }

    rpc_methods!("api.client.ClientService" => {
        /// Materialize the client profile for a freshly registered identity.
        fn register_client(ClientRequest) = "RegisterClient";
        fn fill_client_profile(ClientRequest) = "FillClientProfile";
        fn get_client_profile(ActionByIdRequest) = "GetClientProfile";
        fn delete_client(ActionByIdRequest) = "DeleteClient";
    });

    rpc_methods!("api.client.ProductService" => {
        fn get_all_base_models(GetBaseModelsRequest) = "GetAllBaseModels";
        fn get_products(GetProductsRequest) = "GetProducts";
        fn get_product(ProductArticleRequest) = "GetProduct";
        fn action_product_to_favorites(ProductIntoFavoritesRequest) = "ActionProductToFavorites";
        fn get_favorite_products(Empty) = "GetFavoriteProducts";
    });

    rpc_methods!("api.client.OrderService" => {
        fn create_order(CreateOrderRequest) = "CreateOrder";
        fn complete_order(CompleteOrderRequest) = "CompleteOrder";
        fn add_product_to_order(ProductIntoOrderRequest) = "AddProductToOrder";
        fn get_client_orders(Empty) = "GetClientOrders";
        fn get_order_by_id(ActionByIdRequest) = "GetOrderById";
        fn cancel_order(ActionByIdRequest) = "CancelOrder";
    });
}
