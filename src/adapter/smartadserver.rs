// src/adapter/smartadserver.rs

use std::collections::BTreeMap;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapter::{BidType, Bidder, BidderResponse, Builder, HttpRequest, HttpResponse, TypedBid};
use crate::config::pbs::{DefaultConfig, PbsConfig, SmartAdServerConfig};
use crate::error::{AdapterError, ConfigError};
use crate::openrtb::request::{Banner, BidRequest, Format, Imp, Site};
use crate::openrtb::response::BidResponse;

pub const BIDDER_NAME: &str = "smartadserver";

/// 交易所未声明尺寸时使用的默认 banner 尺寸
const DEFAULT_BANNER_SIZE: (i64, i64) = (728, 90);
const BID_FLOOR: f64 = 0.01;
const BID_FLOOR_CURRENCY: &str = "USD";
const TEST_TARGETING: &str = "testing=prebid";
const TMAX_MS: u64 = 1000;
const FIRST_PRICE_AUCTION: i32 = 1;
const TEST_MODE: i32 = 1;

/// imp.ext 结构：`{"prebid":{"bidder":{"smartadserver":{...}}}}`
#[derive(Serialize)]
struct ImpExt<'a> {
    prebid: PrebidExt<'a>,
}

#[derive(Serialize)]
struct PrebidExt<'a> {
    bidder: BidderExt<'a>,
}

#[derive(Serialize)]
struct BidderExt<'a> {
    smartadserver: SmartAdServerParams<'a>,
}

/// 交易所要求的 bidder 参数，字段名与 wire 格式一致
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SmartAdServerParams<'a> {
    site_id: i64,
    network_id: i64,
    page_id: i64,
    format_id: i64,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<&'a str>,
}

/// **Smart AdServer Builder**
#[derive(Debug, Default, Clone, Copy)]
pub struct SmartAdServerBuilder;

impl SmartAdServerBuilder {
    /// 解析原始配置并构建具体类型的适配器
    pub fn build(&self, raw_config: &[u8]) -> Result<SmartAdServerAdapter, ConfigError> {
        let pbs_config = PbsConfig::from_slice(raw_config)?;
        SmartAdServerAdapter::from_config(pbs_config.adapters.smartadserver)
    }
}

impl Builder for SmartAdServerBuilder {
    fn build_bidder(&self, raw_config: &[u8]) -> Result<Box<dyn Bidder>, ConfigError> {
        Ok(Box::new(self.build(raw_config)?))
    }
}

/// **Smart AdServer 适配器**
///
/// 只持有启动时构建的只读配置，可在所有请求间共享。
#[derive(Debug, Clone)]
pub struct SmartAdServerAdapter {
    endpoint: String,
    platform_id: i64,
    default_config: DefaultConfig,
}

impl SmartAdServerAdapter {
    /// 配置中未启用时直接失败，不产生适配器
    pub fn from_config(config: SmartAdServerConfig) -> Result<Self, ConfigError> {
        if !config.enabled {
            return Err(ConfigError::Disabled(BIDDER_NAME));
        }
        Ok(Self {
            endpoint: config.endpoint,
            platform_id: config.platform_id,
            default_config: config.default_config,
        })
    }

    fn imp_ext(&self, domain: Option<&str>) -> Result<Value, AdapterError> {
        let ext = ImpExt {
            prebid: PrebidExt {
                bidder: BidderExt {
                    smartadserver: SmartAdServerParams {
                        site_id: self.default_config.site_id,
                        network_id: self.platform_id,
                        page_id: self.default_config.page_id,
                        format_id: self.default_config.format_id,
                        target: TEST_TARGETING,
                        domain,
                    },
                },
            },
        };
        serde_json::to_value(&ext).map_err(AdapterError::ExtensionEncode)
    }

    /// 只保留第一个 imp，并补齐交易所需要的字段
    fn enrich_imp(&self, imp: &Imp, domain: Option<&str>) -> Result<Imp, AdapterError> {
        let mut imp = imp.clone();
        imp.ext = Some(self.imp_ext(domain)?);

        match imp.banner.as_mut() {
            None => {
                imp.banner = Some(Banner {
                    format: vec![Format::sized(DEFAULT_BANNER_SIZE.0, DEFAULT_BANNER_SIZE.1)],
                    ..Default::default()
                });
            }
            Some(banner) if banner.format.is_empty() => {
                let (w, h) = match (banner.w, banner.h) {
                    (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
                    _ => DEFAULT_BANNER_SIZE,
                };
                banner.format.push(Format::sized(w, h));
            }
            Some(_) => {}
        }

        imp.bidfloor = Some(BID_FLOOR);
        imp.bidfloorcur = Some(BID_FLOOR_CURRENCY.to_string());
        Ok(imp)
    }

    fn headers() -> BTreeMap<String, String> {
        [
            ("Content-Type", "application/json;charset=utf-8"),
            ("Accept", "application/json"),
            ("X-Openrtb-Version", "2.5"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }
}

impl Bidder for SmartAdServerAdapter {
    fn name(&self) -> &'static str {
        BIDDER_NAME
    }

    fn make_requests(&self, request: &BidRequest) -> Result<Vec<HttpRequest>, AdapterError> {
        debug!(
            endpoint = %self.endpoint,
            site_id = self.default_config.site_id,
            page_id = self.default_config.page_id,
            format_id = self.default_config.format_id,
            network_id = self.platform_id,
            "building smartadserver request"
        );

        let first_imp = request.imp.first().ok_or(AdapterError::NoImpressions)?;
        let domain = request.site_domain();
        let imp = self.enrich_imp(first_imp, domain)?;

        let mut enriched = request.clone();
        enriched.imp = vec![imp];
        enriched.test = Some(TEST_MODE);
        enriched.tmax = Some(TMAX_MS);
        enriched.at = Some(FIRST_PRICE_AUCTION);

        let site = enriched.site.get_or_insert_with(Site::default);
        if site.page.as_deref().map_or(true, str::is_empty) {
            if let Some(domain) = domain {
                site.page = Some(format!("https://{}", domain));
            }
        }

        let body = serde_json::to_vec(&enriched).map_err(AdapterError::RequestEncode)?;
        debug!(
            url = %self.endpoint,
            body = %String::from_utf8_lossy(&body),
            "smartadserver request ready"
        );

        Ok(vec![HttpRequest {
            method: "POST".to_string(),
            uri: self.endpoint.clone(),
            body,
            headers: Self::headers(),
        }])
    }

    fn make_bids(
        &self,
        _request: &BidRequest,
        response: &HttpResponse,
    ) -> Result<BidderResponse, AdapterError> {
        let status = response.status_code;
        debug!(status, headers = ?response.headers, "smartadserver response received");

        if status == StatusCode::NO_CONTENT.as_u16() {
            debug!("smartadserver returned no content");
            return Ok(BidderResponse::default());
        }

        let body = || String::from_utf8_lossy(&response.body).into_owned();

        if status == StatusCode::BAD_REQUEST.as_u16() {
            warn!(body = %body(), "smartadserver rejected the request");
            return Err(AdapterError::BadRequest { body: body() });
        }

        if status == StatusCode::NOT_FOUND.as_u16() {
            warn!(
                body = %body(),
                "smartadserver returned 404; check the endpoint path, the caller id, \
                 the site/page/format ids and the request format"
            );
            return Err(AdapterError::NotFound { body: body() });
        }

        if status != StatusCode::OK.as_u16() {
            warn!(status, "smartadserver returned an unexpected status code");
            return Err(AdapterError::UnexpectedStatus { code: status, body: body() });
        }

        let bid_response: BidResponse =
            serde_json::from_slice(&response.body).map_err(AdapterError::ResponseDecode)?;

        // 交易所只返回 banner 素材
        let bids = bid_response
            .seatbid
            .into_iter()
            .flat_map(|seat| seat.bid)
            .map(|bid| TypedBid { bid, bid_type: BidType::Banner })
            .collect();

        Ok(BidderResponse { bids })
    }
}
