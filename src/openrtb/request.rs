// src/openrtb/request.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::null_as_default;

/// OpenRTB 2.5 BidRequest
///
/// 所有可选字段在缺省时不会写入 wire body（与交易所期望的 omitempty 语义一致）；
/// `ext` 一类的扩展字段保持为不透明的 JSON。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BidRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    /// 广告展示请求列表
    #[serde(default, deserialize_with = "null_as_default")]
    pub imp: Vec<Imp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<Site>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<App>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    /// 测试模式：1 = 测试流量，不计费
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<i32>,
    /// 拍卖类型：1 = 一价，2 = 二价
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<i32>,
    /// 最大响应时间（毫秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmax: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wseat: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bseat: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allimps: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cur: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wlang: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcat: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badv: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bapp: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regs: Option<Regs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,

    /// 未建模的字段（gdpr、schain、eids 等）原样透传
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 单个广告位（imp）
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Imp {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<Banner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Audio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<Native>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmp: Option<Pmp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaymanager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaymanagerver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instl: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidfloor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidfloorcur: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Banner 广告位
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Banner {
    /// 允许的尺寸列表
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub format: Vec<Format>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub btype: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battr: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Format {
    #[serde(default, deserialize_with = "null_as_default")]
    pub w: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub h: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Video {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mimes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minduration: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxduration: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Audio {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mimes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minduration: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxduration: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Native {
    /// Native 请求本身是一段 JSON 编码的字符串
    #[serde(default, deserialize_with = "null_as_default")]
    pub request: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Pmp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_auction: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deals: Option<Vec<Deal>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Deal {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidfloor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidfloorcur: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 网站信息
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Site {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 应用信息
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct App {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storeurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Publisher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 设备信息
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Device {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ua: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dnt: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lmt: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devicetype: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Geo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 用户信息
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyeruid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yob: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 请求来源信息
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fd: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pchain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 隐私法规信息
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Regs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coppa: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Format {
    pub fn sized(w: i64, h: i64) -> Self {
        Self { w, h, ..Default::default() }
    }
}

impl BidRequest {
    /// 请求所属网站的域名（为空字符串时视为缺省）
    pub fn site_domain(&self) -> Option<&str> {
        self.site
            .as_ref()
            .and_then(|site| site.domain.as_deref())
            .filter(|domain| !domain.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_omitted_on_the_wire() {
        let request = BidRequest {
            id: "r1".to_string(),
            imp: vec![Imp { id: "1".to_string(), ..Default::default() }],
            ..Default::default()
        };
        let body = serde_json::to_string(&request).unwrap();
        assert_eq!(body, r#"{"id":"r1","imp":[{"id":"1"}]}"#);
    }

    #[test]
    fn parses_a_typical_banner_request() {
        let raw = r#"{
            "id": "auction-7",
            "imp": [{"id": "1", "banner": {"format": [{"w": 300, "h": 250}]}, "bidfloor": 1.5, "ext": {"foo": 1}}],
            "site": {"domain": "example.com", "page": "https://example.com/news", "ref": "https://ref.example"},
            "device": {"ua": "Mozilla/5.0", "geo": {"country": "FRA", "type": 2}},
            "tmax": 300
        }"#;
        let request: BidRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.imp.len(), 1);
        let banner = request.imp[0].banner.as_ref().unwrap();
        assert_eq!(banner.format, vec![Format::sized(300, 250)]);
        assert_eq!(request.site_domain(), Some("example.com"));
        assert_eq!(request.site.as_ref().unwrap().r#ref.as_deref(), Some("https://ref.example"));
        assert_eq!(request.device.unwrap().geo.unwrap().r#type, Some(2));
        assert_eq!(request.tmax, Some(300));
    }

    #[test]
    fn empty_domain_is_treated_as_absent() {
        let request: BidRequest = serde_json::from_str(r#"{"id":"x","imp":[],"site":{"domain":""}}"#).unwrap();
        assert_eq!(request.site_domain(), None);
    }

    #[test]
    fn explicit_nulls_decode_as_zero_values() {
        let raw = r#"{"id":null,"imp":[{"id":null,"banner":{"format":null,"w":null},"video":{"mimes":null}}]}"#;
        let request: BidRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.id, "");
        assert_eq!(request.imp[0].id, "");
        assert!(request.imp[0].banner.as_ref().unwrap().format.is_empty());
        assert_eq!(request.imp[0].banner.as_ref().unwrap().w, None);
        assert!(request.imp[0].video.as_ref().unwrap().mimes.is_empty());

        let no_imps: BidRequest = serde_json::from_str(r#"{"id":"r","imp":null}"#).unwrap();
        assert!(no_imps.imp.is_empty());
    }

    #[test]
    fn unmodelled_fields_are_kept_on_reencode() {
        let raw = r#"{"id":"r1","imp":[{"id":"1","rwdd":1,"banner":{"format":[{"w":300,"h":250,"wmin":100}]}}],"regs":{"gdpr":1},"at":1,"cattax":2}"#;
        let request: BidRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.extra["cattax"], 2);
        assert_eq!(request.imp[0].extra["rwdd"], 1);

        let reencoded: Value = serde_json::to_value(&request).unwrap();
        let original: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(reencoded, original);
    }
}
