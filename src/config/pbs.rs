// src/config/pbs.rs

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// PBS 配置文件结构（YAML）
///
/// 只做结构解析：缺失或未知的字段一律取零值，不做额外的 schema 校验。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PbsConfig {
    pub adapters: Adapters,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Adapters {
    pub smartadserver: SmartAdServerConfig,
}

/// Smart AdServer 交易所的配置记录，构建完成后只读
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct SmartAdServerConfig {
    pub enabled: bool,
    /// 交易所竞价地址
    pub endpoint: String,
    /// 上报给交易所的 network id
    pub platform_id: i64,
    pub default_config: DefaultConfig,
}

/// 默认的站点 / 页面 / 广告格式 ID
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct DefaultConfig {
    pub site_id: i64,
    pub page_id: i64,
    pub format_id: i64,
    pub platform_id: i64,
}

impl PbsConfig {
    pub fn from_slice(raw: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_slice(raw)?)
    }
}
