use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::null_as_default;

/// OpenRTB Bid Response
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BidResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seatbid: Vec<SeatBid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cur: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customdata: Option<String>,
    /// 不出价原因码
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbr: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SeatBid {
    #[serde(default, deserialize_with = "null_as_default")]
    pub bid: Vec<Bid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Bid {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub impid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lurl: Option<String>,
    /// 广告素材（HTML、VAST 或 native JSON）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adomain: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    /// mtype、dur 等未建模字段，随出价一起保留
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BidResponse {
    /// 全部 seat 下的 bid 数量
    pub fn bid_count(&self) -> usize {
        self.seatbid.iter().map(|seat| seat.bid.len()).sum()
    }
}
