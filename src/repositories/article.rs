use crate::{
    error::Result,
    models::{
        article::{Article, ArticleFilter, ArticleSort},
        pagination::{PageRequest, Paginated},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashSet;
use tracing::debug;

const ARTICLE_COLUMNS: &str = "trending_id, article_id, url, title, publish_date, analyzed_date, \
     summary, content, main_category, COALESCE(categories, '{}') AS categories, image_url, trend, \
     COALESCE(similarity_score, 0) AS similarity_score";

#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// 按过滤条件与排序方式取一页数据，并返回匹配总数
    async fn find_and_count(
        &self,
        filter: &ArticleFilter,
        sort: ArticleSort,
        page: PageRequest,
    ) -> Result<Paginated<Article>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>>;

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>>;

    /// 返回能找到的文章，找不到的链接直接忽略
    async fn find_by_urls(&self, urls: &[String]) -> Result<Vec<Article>>;

    async fn update_summary(&self, id: &str, summary: &str, analyzed_at: DateTime<Utc>) -> Result<()>;
}

#[derive(Clone)]
pub struct PgArticleRepository {
    pool: PgPool,
}

impl PgArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ArticleFilter) {
    let has_cond = filter.category.is_some() || filter.date_range.is_some() || filter.min_score.is_some();
    if !has_cond {
        return;
    }

    qb.push(" WHERE ");
    let mut separated = qb.separated(" AND ");
    if let Some(category) = &filter.category {
        separated.push("main_category = ").push_bind_unseparated(category.clone());
    }
    if let Some(range) = &filter.date_range {
        separated.push("publish_date >= ").push_bind_unseparated(range.start());
        separated.push("publish_date <= ").push_bind_unseparated(range.end());
    }
    if let Some(min_score) = filter.min_score {
        separated.push("similarity_score >= ").push_bind_unseparated(min_score);
    }
}

pub(crate) fn build_list_query(
    filter: &ArticleFilter,
    sort: ArticleSort,
    page: PageRequest,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM articles", ARTICLE_COLUMNS));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY ").push(sort.order_by());
    qb.push(" LIMIT ").push_bind(page.limit());
    qb.push(" OFFSET ").push_bind(page.offset());
    qb
}

pub(crate) fn build_count_query(filter: &ArticleFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM articles");
    push_filter(&mut qb, filter);
    qb
}

/// 去重并保持首次出现的顺序
pub(crate) fn distinct_urls(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}

#[async_trait]
impl ArticleRepository for PgArticleRepository {
    async fn find_and_count(
        &self,
        filter: &ArticleFilter,
        sort: ArticleSort,
        page: PageRequest,
    ) -> Result<Paginated<Article>> {
        debug!("Querying articles: filter={:?} sort={:?} page={:?}", filter, sort, page);

        let rows = build_list_query(filter, sort, page)
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await?;

        let count: i64 = build_count_query(filter)
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(Paginated { rows, count })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>> {
        let sql = format!("SELECT {} FROM articles WHERE trending_id = $1", ARTICLE_COLUMNS);
        let article = sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        let sql = format!("SELECT {} FROM articles WHERE url = $1", ARTICLE_COLUMNS);
        let article = sqlx::query_as::<_, Article>(&sql)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    async fn find_by_urls(&self, urls: &[String]) -> Result<Vec<Article>> {
        let urls = distinct_urls(urls);
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {} FROM articles WHERE url = ANY($1)", ARTICLE_COLUMNS);
        let articles = sqlx::query_as::<_, Article>(&sql)
            .bind(&urls)
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    async fn update_summary(&self, id: &str, summary: &str, analyzed_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE articles SET summary = $1, analyzed_date = $2 WHERE trending_id = $3")
            .bind(summary)
            .bind(analyzed_at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
