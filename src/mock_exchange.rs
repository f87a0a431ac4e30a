use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{serve, Json, Router};
use rand::Rng;
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};
use tracing::info;
use uuid::Uuid;

use crate::openrtb::request::BidRequest;
use crate::openrtb::response::{Bid, BidResponse, SeatBid};

/// 模拟交易所竞价响应
///
/// 没有 imp 时返回 204；否则为每个 banner imp 按底价随机加价出一个 HTML 素材。
pub async fn handle_exchange_bid(Json(request): Json<BidRequest>) -> Response {
    info!(
        request_id = %request.id,
        imp_count = request.imp.len(),
        "mock exchange received bid request"
    );

    let delay_ms = rand::thread_rng().gen_range(10..50);
    sleep(Duration::from_millis(delay_ms)).await;

    let bids: Vec<Bid> = request
        .imp
        .iter()
        .filter_map(|imp| {
            let format = imp.banner.as_ref()?.format.first()?;
            let bid_id = Uuid::new_v4().to_string();
            let multiplier = if format.w == 728 && format.h == 90 {
                rand::thread_rng().gen_range(0.8..1.2)
            } else {
                rand::thread_rng().gen_range(1.0..3.0)
            };
            let adm = format!(
                "<html><body>Mock Exchange Banner<br/><img src=\"http://exchange-tracker.local/impression?bid={bid_id}\" style=\"display:none;\" /></body></html>",
                bid_id = bid_id
            );
            Some(Bid {
                id: bid_id,
                impid: imp.id.clone(),
                price: imp.bidfloor.unwrap_or(0.0) * multiplier,
                adm: Some(adm),
                crid: Some("mock-creative".to_string()),
                w: Some(format.w),
                h: Some(format.h),
                ..Default::default()
            })
        })
        .collect();

    if bids.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }

    Json(BidResponse {
        id: request.id.clone(),
        seatbid: vec![SeatBid {
            bid: bids,
            seat: Some("mock_seat".to_string()),
            ..Default::default()
        }],
        cur: Some("USD".to_string()),
        ..Default::default()
    })
    .into_response()
}

/// 启动模拟交易所，路由为 `/bid`
pub async fn start_mock_exchange(port: u16) -> std::io::Result<()> {
    let app = Router::new().route("/bid", post(handle_exchange_bid));
    let addr = format!("0.0.0.0:{}", port);
    info!("mock exchange running at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    serve(listener, app).await
}
