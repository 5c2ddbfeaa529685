//! Fulfillment-manager backend: order hand-over and cancellation.

use serde::{Deserialize, Serialize};

use super::{ActionByIdRequest, Empty, SharedChannel, rpc_methods};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaidOrderRequest {
    pub order_id: i64,
}

#[derive(Clone)]
pub struct ManagerClient {
    channel: SharedChannel,
}

impl ManagerClient {
    pub fn new(channel: SharedChannel) -> Self {
        Self { channel }
    }

    rpc_methods!("api.manager.ManagerService" => {
        fn get_all_orders(Empty) = "GetAllOrders";
        fn get_order_by_id(ActionByIdRequest) = "GetOrderById";
        fn give_order(PaidOrderRequest) = "GiveOrder";
        fn cancel_order(ActionByIdRequest) = "CancelOrder";
    });
}
