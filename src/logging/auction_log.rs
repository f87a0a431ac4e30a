use serde::{Deserialize, Serialize};

use crate::bidding::AuctionOutcome;
use crate::error::AuctionError;
use crate::logging::runtime_logger::local_timestamp;

/// **单次竞价的汇总日志**
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuctionLog {
    pub timestamp: String,            // 记录时间
    pub log_type: String,             // 固定为 "edge_auction"
    pub request_id: String,           // OpenRTB `BidRequest.id`
    pub bidder: String,               // 交易所名称
    pub imp_count: usize,             // 入站请求中的 imp 数量
    pub wire_requests: usize,         // 生成的 wire 请求数量
    pub failed_sends: usize,          // 发送失败次数
    pub exchange_status: Option<u16>, // 交易所返回的状态码
    pub bid_count: usize,             // 归一化后的出价数量
    pub outcome: String,              // "bids" / "no_bid" / "rejected" / "failed"
    pub error_kind: Option<String>,   // 错误分类
    pub error: Option<String>,        // 错误描述
    pub elapsed_ms: u128,             // 总耗时
}

impl AuctionLog {
    pub fn new(request_id: &str, bidder: &str, imp_count: usize) -> Self {
        Self {
            timestamp: local_timestamp(),
            log_type: "edge_auction".to_string(),
            request_id: request_id.to_string(),
            bidder: bidder.to_string(),
            imp_count,
            wire_requests: 0,
            failed_sends: 0,
            exchange_status: None,
            bid_count: 0,
            outcome: "failed".to_string(),
            error_kind: None,
            error: None,
            elapsed_ms: 0,
        }
    }

    /// 记录交易所响应及其归一化结果
    pub fn record_outcome(&mut self, outcome: &AuctionOutcome) {
        self.wire_requests = outcome.wire_requests;
        self.failed_sends = outcome.failed_sends.len();
        self.exchange_status = Some(outcome.exchange_response.status_code);
        match &outcome.normalized {
            Ok(response) if response.bids.is_empty() => {
                self.outcome = "no_bid".to_string();
            }
            Ok(response) => {
                self.bid_count = response.bids.len();
                self.outcome = "bids".to_string();
            }
            Err(e) => {
                self.outcome = "rejected".to_string();
                self.error_kind = Some(e.kind().as_str().to_string());
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn record_failure(&mut self, error: &AuctionError) {
        self.outcome = "failed".to_string();
        match error {
            AuctionError::MakeRequests(errors) => {
                self.error_kind = errors.first().map(|e| e.kind().as_str().to_string());
            }
            AuctionError::AllSendsFailed(errors) => {
                self.failed_sends = errors.len();
                self.wire_requests = errors.len();
                self.error_kind = Some("transport".to_string());
            }
        }
        self.error = Some(error.to_string());
    }

    pub fn finish(&mut self, elapsed_ms: u128) {
        self.elapsed_ms = elapsed_ms;
    }

    /// 失败和被拒绝的竞价记为 ERROR，其余为 INFO
    pub fn level(&self) -> &'static str {
        match self.outcome.as_str() {
            "failed" | "rejected" => "ERROR",
            _ => "INFO",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
