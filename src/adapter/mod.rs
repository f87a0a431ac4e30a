// src/adapter/mod.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, ConfigError};
use crate::openrtb::request::BidRequest;
use crate::openrtb::response::Bid;

pub mod smartadserver;

pub use smartadserver::{SmartAdServerAdapter, SmartAdServerBuilder};

/// 发往交易所的 HTTP 请求
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub uri: String,
    pub body: Vec<u8>,
    pub headers: BTreeMap<String, String>,
}

/// 交易所返回的原始 HTTP 响应
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub headers: BTreeMap<String, String>,
}

/// 出价的素材类型
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BidType {
    Banner,
    Video,
    Audio,
    Native,
}

/// 带素材类型标记的单个出价
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TypedBid {
    pub bid: Bid,
    pub bid_type: BidType,
}

/// 归一化后的出价列表
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BidderResponse {
    pub bids: Vec<TypedBid>,
}

/// **交易所适配器**
///
/// 不做任何 I/O：`make_requests` 只构造 wire 请求，`make_bids` 只解析 wire 响应，
/// 真正的网络发送由调用方负责。
pub trait Bidder: Send + Sync {
    /// 交易所名称，用于日志
    fn name(&self) -> &'static str;

    /// 将 OpenRTB 请求翻译为发往交易所的 HTTP 请求
    fn make_requests(&self, request: &BidRequest) -> Result<Vec<HttpRequest>, AdapterError>;

    /// 将交易所响应解析为归一化出价；204 视为合法的不出价
    fn make_bids(
        &self,
        request: &BidRequest,
        response: &HttpResponse,
    ) -> Result<BidderResponse, AdapterError>;
}

/// 从原始配置字节构建适配器，失败时不产生任何适配器
pub trait Builder {
    fn build_bidder(&self, raw_config: &[u8]) -> Result<Box<dyn Bidder>, ConfigError>;
}
