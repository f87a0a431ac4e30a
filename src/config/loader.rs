// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// 启动时一次性读取 PBS 配置原始字节，交给 Builder 解析
pub fn load_config_bytes(path: &Path) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}
