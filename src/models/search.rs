use crate::{models::article::ArticleResponse, utils::serde_helpers::empty_as_none};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub size: Option<u32>,
}

/// 搜索引擎返回的单条命中
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub url: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub total: i64,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleSearchResult {
    #[serde(flatten)]
    pub article: ArticleResponse,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub results: Vec<ArticleSearchResult>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
}
