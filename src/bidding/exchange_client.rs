// src/bidding/exchange_client.rs

use std::collections::BTreeMap;
use std::future::Future;

use reqwest::{Client, Method};
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::adapter::{HttpRequest, HttpResponse};
use crate::error::DispatchError;

/// 把适配器构造好的 wire 请求真正发出去
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, DispatchError>> + Send;
}

/// 基于 reqwest 的交易所客户端，每次发送（含读取响应体）都带超时
#[derive(Clone)]
pub struct ExchangeClient {
    client: Client,
    timeout_ms: u64,
}

impl ExchangeClient {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            client: Client::new(),
            timeout_ms,
        }
    }
}

impl Transport for ExchangeClient {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, DispatchError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| DispatchError::InvalidMethod(request.method.clone()))?;

        let mut builder = self
            .client
            .request(method, &request.uri)
            .body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!(uri = %request.uri, method = %request.method, "sending request to exchange");

        let exchange_call = async {
            let response = builder.send().await.map_err(DispatchError::Send)?;
            let status_code = response.status().as_u16();
            let headers: BTreeMap<String, String> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.bytes().await.map_err(DispatchError::Body)?;

            Ok::<_, DispatchError>(HttpResponse {
                status_code,
                body: body.to_vec(),
                headers,
            })
        };

        timeout(Duration::from_millis(self.timeout_ms), exchange_call)
            .await
            .map_err(|_| DispatchError::Timeout(self.timeout_ms))?
    }
}
