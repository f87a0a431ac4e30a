use serde::{Deserialize, Deserializer};

pub mod request;
pub mod response;

/// 显式的 JSON `null` 按零值处理（空字符串、空数组、0）
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
