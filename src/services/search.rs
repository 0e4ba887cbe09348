use crate::{
    config::Config,
    error::{AppError, Result},
    models::{
        article::{Article, ArticleResponse},
        search::{ArticleSearchResult, SearchHit, SearchHits, SearchQuery, SearchResponse},
    },
    repositories::ArticleRepository,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_SEARCH_SIZE: u32 = 20;

/// 全文检索与向量检索
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// 在标题与摘要上做 multi_match 查询
    async fn search(&self, query: &str, from: u64, size: u32) -> Result<SearchHits>;

    /// 近邻查询，按相似度降序返回
    async fn knn(&self, vector: Vec<f32>, k: u32) -> Result<Vec<SearchHit>>;
}

#[derive(Deserialize)]
struct EsResponse {
    hits: EsHits,
}

#[derive(Deserialize)]
struct EsHits {
    #[serde(default)]
    total: Option<EsTotal>,
    #[serde(default)]
    hits: Vec<EsHit>,
}

#[derive(Deserialize)]
struct EsTotal {
    value: i64,
}

#[derive(Deserialize)]
struct EsHit {
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: EsSource,
}

#[derive(Deserialize)]
struct EsSource {
    url: String,
}

impl From<EsHit> for SearchHit {
    fn from(hit: EsHit) -> Self {
        Self {
            url: hit.source.url,
            score: hit.score.unwrap_or_default(),
        }
    }
}

/// Elasticsearch HTTP 客户端
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Client,
    base_url: String,
    index: String,
    username: Option<String>,
    password: Option<String>,
}

impl ElasticsearchClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.search_url.trim_end_matches('/').to_string(),
            index: config.search_index.clone(),
            username: config.search_username.clone(),
            password: config.search_password.clone(),
        })
    }

    async fn post_search(&self, body: Value) -> Result<EsResponse> {
        let mut request = self
            .client
            .post(format!("{}/{}/_search", self.base_url, self.index))
            .json(&body);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            error!("Search engine returned status {}", response.status());
            return Err(AppError::ExternalService("Search engine request failed".to_string()));
        }
        Ok(response.json().await?)
    }
}

pub(crate) fn multi_match_body(query: &str, from: u64, size: u32) -> Value {
    json!({
        "from": from,
        "size": size,
        "_source": ["url"],
        "query": {
            "multi_match": {
                "query": query,
                "fields": ["title^2", "summary"]
            }
        }
    })
}

pub(crate) fn knn_body(vector: &[f32], k: u32) -> Value {
    json!({
        "size": k,
        "_source": ["url"],
        "knn": {
            "field": "embedding",
            "query_vector": vector,
            "k": k,
            "num_candidates": (k * 10).max(100)
        }
    })
}

#[async_trait]
impl SearchEngine for ElasticsearchClient {
    async fn search(&self, query: &str, from: u64, size: u32) -> Result<SearchHits> {
        let response = self.post_search(multi_match_body(query, from, size)).await?;
        Ok(SearchHits {
            total: response.hits.total.map(|t| t.value).unwrap_or_default(),
            hits: response.hits.hits.into_iter().map(SearchHit::from).collect(),
        })
    }

    async fn knn(&self, vector: Vec<f32>, k: u32) -> Result<Vec<SearchHit>> {
        let response = self.post_search(knn_body(&vector, k)).await?;
        Ok(response.hits.hits.into_iter().map(SearchHit::from).collect())
    }
}

/// 按命中顺序回填文章，数据库中不存在的链接被跳过
pub(crate) fn hydrate_in_order(hits: &[SearchHit], articles: Vec<Article>) -> Vec<(Article, f64)> {
    let mut by_url: HashMap<String, Article> =
        articles.into_iter().map(|a| (a.url.clone(), a)).collect();
    hits.iter()
        .filter_map(|hit| by_url.remove(&hit.url).map(|article| (article, hit.score)))
        .collect()
}

#[derive(Clone)]
pub struct SearchService {
    engine: Arc<dyn SearchEngine>,
    articles: Arc<dyn ArticleRepository>,
    max_page_size: u32,
}

impl SearchService {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        articles: Arc<dyn ArticleRepository>,
        config: &Config,
    ) -> Self {
        Self {
            engine,
            articles,
            max_page_size: config.max_page_size,
        }
    }

    pub async fn search_articles(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let q = query.q.trim();
        if q.is_empty() {
            return Err(AppError::validation("q must not be empty"));
        }

        let page = query.page.unwrap_or(1);
        let size = query.size.unwrap_or(DEFAULT_SEARCH_SIZE);
        if page < 1 || size < 1 {
            return Err(AppError::validation("page and size must be at least 1"));
        }
        if size > self.max_page_size {
            return Err(AppError::Validation(format!(
                "size must not exceed {}",
                self.max_page_size
            )));
        }

        debug!("Searching articles: q={} page={} size={}", q, page, size);

        let from = (page as u64 - 1) * size as u64;
        let hits = self.engine.search(q, from, size).await?;
        let urls: Vec<String> = hits.hits.iter().map(|hit| hit.url.clone()).collect();
        let articles = self.articles.find_by_urls(&urls).await?;

        let results = hydrate_in_order(&hits.hits, articles)
            .into_iter()
            .map(|(article, score)| ArticleSearchResult {
                article: ArticleResponse::from(article),
                score,
            })
            .collect();

        Ok(SearchResponse {
            results,
            total: hits.total,
            page,
            size,
        })
    }
}
