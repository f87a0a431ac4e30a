use std::sync::Arc;

use axum::routing::any;
use axum::Router;

use crate::bidding::Transport;
use crate::AppState;

pub mod handlers;

pub const AUCTION_PATH: &str = "/openrtb2/auction";

/// 只暴露竞价路径，其余路径返回 404
///
/// 竞价路径只按路径匹配、不限制 HTTP 方法：非 POST 请求同样进入解析流程，
/// 空 body 因无法解析而得到 400。
pub fn router<T: Transport + 'static>(state: Arc<AppState<T>>) -> Router {
    Router::new()
        .route(AUCTION_PATH, any(handlers::handle_auction::<T>))
        .fallback(handlers::handle_not_found)
        .with_state(state)
}
