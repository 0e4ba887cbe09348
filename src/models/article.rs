use crate::{
    models::pagination::{DateRange, PaginationQuery},
    utils::serde_helpers::empty_as_none,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `articles` 表中的一行，由外部采集流程写入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub trending_id: String,
    pub article_id: Option<String>,
    pub url: String,
    pub title: String,
    pub publish_date: DateTime<Utc>,
    pub analyzed_date: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub main_category: Option<String>,
    pub categories: Vec<String>,
    pub image_url: Option<String>,
    pub trend: Option<String>,
    pub similarity_score: f64,
}

impl Article {
    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().map_or(false, |s| !s.trim().is_empty())
    }

    /// 用于生成向量与摘要的文本
    pub fn embedding_text(&self) -> String {
        match self.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(summary) => format!("{}\n\n{}", self.title, summary),
            None => self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleResponse {
    pub trending_id: String,
    pub article_id: Option<String>,
    pub url: String,
    pub title: String,
    pub publish_date: DateTime<Utc>,
    pub analyzed_date: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub main_category: Option<String>,
    pub categories: Vec<String>,
    pub image_url: Option<String>,
    pub trend: Option<String>,
    pub similarity_score: f64,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            trending_id: article.trending_id,
            article_id: article.article_id,
            url: article.url,
            title: article.title,
            publish_date: article.publish_date,
            analyzed_date: article.analyzed_date,
            summary: article.summary,
            main_category: article.main_category,
            categories: article.categories,
            image_url: article.image_url,
            trend: article.trend,
            similarity_score: article.similarity_score,
        }
    }
}

/// 文章列表的过滤条件，各条件之间为 AND 关系
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFilter {
    pub category: Option<String>,
    pub date_range: Option<DateRange>,
    pub min_score: Option<f64>,
}

impl ArticleFilter {
    pub fn by_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn by_date_range(range: DateRange) -> Self {
        Self {
            date_range: Some(range),
            ..Default::default()
        }
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    /// 内存仓储使用的等价过滤
    #[cfg(test)]
    pub fn matches(&self, article: &Article) -> bool {
        if let Some(category) = &self.category {
            if article.main_category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            if !range.contains(article.publish_date) {
                return false;
            }
        }
        if let Some(min_score) = self.min_score {
            if article.similarity_score < min_score {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArticleSort {
    /// 发布时间倒序
    #[default]
    Latest,
    /// 相似度得分倒序，得分相同时按发布时间倒序
    Trending,
}

impl ArticleSort {
    pub fn order_by(&self) -> &'static str {
        match self {
            ArticleSort::Latest => "publish_date DESC",
            ArticleSort::Trending => "similarity_score DESC, publish_date DESC",
        }
    }

    #[cfg(test)]
    pub fn compare(&self, a: &Article, b: &Article) -> std::cmp::Ordering {
        match self {
            ArticleSort::Latest => b.publish_date.cmp(&a.publish_date),
            ArticleSort::Trending => b
                .similarity_score
                .total_cmp(&a.similarity_score)
                .then_with(|| b.publish_date.cmp(&a.publish_date)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    pub category: String,
    #[serde(flatten)]
    pub pagination: PaginationQuery,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub min_score: Option<f64>,
    #[serde(flatten)]
    pub pagination: PaginationQuery,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedQuery {
    pub url: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub top: Option<u32>,
}
