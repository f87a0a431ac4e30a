//! OpenRTB edge auction service for the Smart AdServer exchange.
//!
//! The adapter translates inbound bid requests into the exchange's wire format
//! and classifies its responses; the edge dispatcher sends the wire request and
//! relays the answer.

use std::sync::Arc;

pub mod adapter;
pub mod api;
pub mod bidding;
pub mod config;
pub mod error;
pub mod logging;
pub mod mock_exchange;
pub mod openrtb;

use adapter::Bidder;
use bidding::ExchangeClient;
use logging::RuntimeLogger;

/// 全局共享状态：启动时构建一次，之后只读
pub struct AppState<T = ExchangeClient> {
    pub bidder: Arc<dyn Bidder>,
    pub transport: T,
    pub runtime_logger: Arc<RuntimeLogger>,
}
