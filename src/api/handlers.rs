use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, info, warn};

use crate::adapter::HttpResponse;
use crate::bidding::{run_auction, Transport};
use crate::logging::AuctionLog;
use crate::openrtb::request::BidRequest;
use crate::AppState;

/// **处理 OpenRTB 竞价请求**
///
/// - body 无法解析 -> 400，不调用适配器
/// - 适配器构造请求失败 -> 500
/// - 所有 wire 请求都发送失败 -> 500
/// - 否则原样转发第一个成功的交易所响应
pub async fn handle_auction<T: Transport + 'static>(
    State(state): State<Arc<AppState<T>>>,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    info!(bytes = body.len(), "received request to /openrtb2/auction");

    let bid_request = match parse_bid_request(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "failed to parse bid request");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let mut auction_log = AuctionLog::new(&bid_request.id, state.bidder.name(), bid_request.imp.len());
    let response = match run_auction(state.bidder.as_ref(), &state.transport, &bid_request).await {
        Ok(outcome) => {
            auction_log.record_outcome(&outcome);
            relay(&outcome.exchange_response)
        }
        Err(e) => {
            error!(request_id = %bid_request.id, error = %e, "auction failed");
            auction_log.record_failure(&e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    };

    auction_log.finish(start.elapsed().as_millis());
    state
        .runtime_logger
        .log(auction_log.level(), &auction_log.to_json())
        .await;

    response
}

/// 非竞价路径一律 404
pub async fn handle_not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// simd-json 需要可写缓冲区，先拷贝一份 body
fn parse_bid_request(body: &[u8]) -> Result<BidRequest, simd_json::Error> {
    let mut buf = body.to_vec();
    simd_json::serde::from_slice(&mut buf)
}

fn relay(exchange_response: &HttpResponse) -> Response {
    let status = StatusCode::from_u16(exchange_response.status_code).unwrap_or(StatusCode::BAD_GATEWAY);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        exchange_response.body.clone(),
    )
        .into_response()
}
