//! HTTP bridge channel.

use async_trait::async_trait;
use std::time::Duration;

use super::{CallContext, RpcChannel, RpcError, RpcResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Channel that posts each encoded request to `<base>/<method>` and forwards
/// call metadata as request headers.
#[derive(Clone)]
pub struct HttpChannel {
    base: String,
    client: reqwest::Client,
}

impl HttpChannel {
    pub fn new(base: &str) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RpcError::Unavailable(e.to_string()))?;

        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url_for(&self, method: &str) -> String {
        format!("{}/{}", self.base, method.trim_start_matches('/'))
    }
}

#[async_trait]
impl RpcChannel for HttpChannel {
    async fn unary(
        &self,
        ctx: &CallContext,
        method: &str,
        payload: Vec<u8>,
    ) -> RpcResult<Vec<u8>> {
        let mut request = self
            .client
            .post(self.url_for(method))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);

        for (key, value) in ctx.metadata() {
            request = request.header(key, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RpcError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RpcError::Unavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(RpcError::Status {
                code: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body.to_vec())
    }
}
