/// 查询参数的反序列化辅助模块

use serde::{de, Deserialize, Deserializer};
use std::{fmt, str::FromStr};

/// 将空字符串视为缺省值 (例如: `?category=&page=`)
///
/// 查询字符串中的值一律为字符串，这里统一解析为 `Option<T>`。
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => FromStr::from_str(value).map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Params {
        #[serde(default, deserialize_with = "empty_as_none")]
        page: Option<u32>,
        #[serde(default, deserialize_with = "empty_as_none")]
        category: Option<String>,
    }

    fn parse(query: &str) -> Result<Params, serde_json::Error> {
        let map: std::collections::HashMap<String, String> = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        serde_json::from_value(serde_json::to_value(map).unwrap())
    }

    #[test]
    fn test_empty_values_become_none() {
        let params = parse("page=&category=").unwrap();
        assert_eq!(params.page, None);
        assert_eq!(params.category, None);
    }

    #[test]
    fn test_present_values_are_parsed() {
        let params = parse("page=3&category=Technology").unwrap();
        assert_eq!(params.page, Some(3));
        assert_eq!(params.category.as_deref(), Some("Technology"));
    }

    #[test]
    fn test_missing_values_use_default() {
        let params = parse("").unwrap();
        assert_eq!(params.page, None);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        assert!(parse("page=abc").is_err());
    }
}
