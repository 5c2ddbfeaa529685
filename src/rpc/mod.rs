//! Outbound calls to the backend services.
//!
//! Each backend domain (administration, customer, fulfillment manager) is reached
//! through an [`RpcChannel`]. Typed service clients in the submodules build one
//! statically typed request per operation and hand the encoded message to the
//! channel together with the caller's [`CallContext`].

pub mod admin;
pub mod customer;
pub mod manager;

mod http;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub use http::HttpChannel;

/// Metadata key carrying the authenticated subject id on outbound calls.
pub const USER_ID_METADATA: &str = "user_id";

/// Reply payload. The backends own the response schemas; the gateway only
/// reshapes them into the response envelope.
pub type Reply = serde_json::Value;

pub type RpcResult<T = Reply> = Result<T, RpcError>;

/// Per-call metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    pub user_id: Option<i64>,
}

impl CallContext {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// Metadata entries to attach to the call. Empty when there is no caller.
    pub fn metadata(&self) -> Vec<(&'static str, String)> {
        self.user_id
            .map(|id| vec![(USER_ID_METADATA, id.to_string())])
            .unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The backend answered with an error status.
    #[error("{message}")]
    Status { code: u16, message: String },
    /// The request or reply could not be encoded/decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

/// Transport seam for unary calls. `method` is the fully qualified method path,
/// e.g. `/api.client.ClientService/RegisterClient`.
#[async_trait]
pub trait RpcChannel: Send + Sync {
    async fn unary(&self, ctx: &CallContext, method: &str, payload: Vec<u8>)
    -> RpcResult<Vec<u8>>;
}

pub type SharedChannel = Arc<dyn RpcChannel>;

/// Encode a typed request, perform the call and decode the reply.
pub async fn call<Req, Resp>(
    channel: &dyn RpcChannel,
    ctx: &CallContext,
    method: &str,
    request: &Req,
) -> RpcResult<Resp>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let payload = serde_json::to_vec(request).map_err(|e| RpcError::Codec(e.to_string()))?;
    tracing::debug!(method, user_id = ?ctx.user_id, "Calling backend");
    let reply = channel.unary(ctx, method, payload).await?;
    if reply.is_empty() {
        return serde_json::from_slice(b"null").map_err(|e| RpcError::Codec(e.to_string()));
    }
    serde_json::from_slice(&reply).map_err(|e| RpcError::Codec(e.to_string()))
}

/// Request message for operations without input.
#[derive(Debug, Clone, Copy, Default, Serialize, serde::Deserialize)]
pub struct Empty {}

/// Request addressing a single entity by numeric id.
#[derive(Debug, Clone, Copy, Serialize, serde::Deserialize)]
pub struct ActionByIdRequest {
    pub id: i64,
}

/// Request addressing a product by its article.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct ProductArticleRequest {
    pub article: String,
}

/// Request listing the entries of one catalogue reference table.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct GetBaseModelsRequest {
    pub base_model_name: String,
}

/// One order line.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct OrderProduct {
    pub article: String,
    pub quantity: i32,
}

/// Customer profile message, used by signup and profile maintenance.
#[derive(Debug, Clone, Default, Serialize, serde::Deserialize)]
pub struct ClientRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patronymic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Generate typed client methods: one method per remote operation, each taking
/// its own request type and forwarding to the channel under the service prefix.
macro_rules! rpc_methods {
    ($service:literal => { $( $(#[$meta:meta])* fn $name:ident($req:ty) = $method:literal; )* }) => {
        $(
            $(#[$meta])*
            pub async fn $name(
                &self,
                ctx: &$crate::rpc::CallContext,
                request: &$req,
            ) -> $crate::rpc::RpcResult {
                $crate::rpc::call(
                    self.channel.as_ref(),
                    ctx,
                    concat!("/", $service, "/", $method),
                    request,
                )
                .await
            }
        )*
    };
}

pub(crate) use rpc_methods;
