use crate::{
    config::Config,
    error::{AppError, Result},
    models::{
        article::{Article, ArticleFilter, ArticleResponse, ArticleSort, CategoryQuery, RelatedQuery, TrendingQuery},
        pagination::{DateRangeQuery, ListResponse, PageRequest, Paginated, PaginationQuery},
    },
    repositories::ArticleRepository,
    services::{llm::LanguageModel, search::hydrate_in_order, search::SearchEngine},
    utils::validation::validate_article_url,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_RELATED_TOP: u32 = 5;

#[derive(Clone)]
pub struct ArticleService {
    articles: Arc<dyn ArticleRepository>,
    llm: Arc<dyn LanguageModel>,
    engine: Arc<dyn SearchEngine>,
    default_page_size: u32,
    max_page_size: u32,
}

impl ArticleService {
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        llm: Arc<dyn LanguageModel>,
        engine: Arc<dyn SearchEngine>,
        config: &Config,
    ) -> Self {
        Self {
            articles,
            llm,
            engine,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    fn page(&self, query: &PaginationQuery) -> Result<PageRequest> {
        query.resolve(self.default_page_size, self.max_page_size)
    }

    async fn list(
        &self,
        filter: ArticleFilter,
        sort: ArticleSort,
        page: PageRequest,
    ) -> Result<ListResponse<ArticleResponse>> {
        let result = self.articles.find_and_count(&filter, sort, page).await?;
        let result = Paginated {
            rows: result.rows.into_iter().map(ArticleResponse::from).collect(),
            count: result.count,
        };
        Ok(ListResponse::from_page(result, page))
    }

    /// 获取全部文章，按发布时间倒序
    pub async fn get_all_articles(&self, query: &PaginationQuery) -> Result<ListResponse<ArticleResponse>> {
        let page = self.page(query)?;
        debug!("Getting all articles: {:?}", page);
        self.list(ArticleFilter::default(), ArticleSort::Latest, page).await
    }

    /// 获取日期范围内的文章
    pub async fn get_articles_between_dates(&self, query: &DateRangeQuery) -> Result<ListResponse<ArticleResponse>> {
        let range = query.range()?;
        let page = self.page(&query.pagination)?;
        debug!("Getting articles between {} and {}", range.start(), range.end());
        self.list(ArticleFilter::by_date_range(range), ArticleSort::Latest, page).await
    }

    /// 获取指定分类的文章
    pub async fn get_articles_by_category(&self, query: &CategoryQuery) -> Result<ListResponse<ArticleResponse>> {
        let category = query.category.trim();
        if category.is_empty() {
            return Err(AppError::validation("category must not be empty"));
        }
        let page = self.page(&query.pagination)?;
        debug!("Getting articles in category: {}", category);
        self.list(ArticleFilter::by_category(category), ArticleSort::Latest, page).await
    }

    /// 获取热门文章，`category` 存在时转为分类热门
    pub async fn get_trending_articles(&self, query: &TrendingQuery) -> Result<ListResponse<ArticleResponse>> {
        let min_score = query.min_score.unwrap_or(0.0);
        if !min_score.is_finite() {
            return Err(AppError::validation("minScore must be a finite number"));
        }
        let page = self.page(&query.pagination)?;

        match query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(category) => self.get_trending_articles_by_category(category, min_score, page).await,
            None => {
                debug!("Getting trending articles: min_score={}", min_score);
                let filter = ArticleFilter::default().with_min_score(min_score);
                self.list(filter, ArticleSort::Trending, page).await
            }
        }
    }

    pub async fn get_trending_articles_by_category(
        &self,
        category: &str,
        min_score: f64,
        page: PageRequest,
    ) -> Result<ListResponse<ArticleResponse>> {
        debug!("Getting trending articles in {}: min_score={}", category, min_score);
        let filter = ArticleFilter::by_category(category).with_min_score(min_score);
        self.list(filter, ArticleSort::Trending, page).await
    }

    /// 获取单篇文章，缺少摘要时即时生成并保存
    pub async fn get_article_by_id(&self, id: &str) -> Result<ArticleResponse> {
        debug!("Getting article by id: {}", id);

        let mut article = self
            .articles
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Article"))?;

        if !article.has_summary() {
            self.generate_summary(&mut article).await?;
        }

        Ok(ArticleResponse::from(article))
    }

    async fn generate_summary(&self, article: &mut Article) -> Result<()> {
        let content = article
            .content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(&article.title);

        match self.llm.summarize(&article.title, content).await {
            Ok(summary) => {
                let analyzed_at = Utc::now();
                self.articles
                    .update_summary(&article.trending_id, &summary, analyzed_at)
                    .await?;
                info!("Generated summary for article: {}", article.trending_id);
                article.summary = Some(summary);
                article.analyzed_date = Some(analyzed_at);
            }
            Err(e) => {
                warn!("Summary generation failed for {}: {}", article.trending_id, e);
            }
        }
        Ok(())
    }

    /// 基于向量相似度的相关文章
    pub async fn get_related_articles(&self, query: &RelatedQuery) -> Result<Vec<ArticleResponse>> {
        let url = query.url.trim();
        validate_article_url(url)?;

        let top = query.top.unwrap_or(DEFAULT_RELATED_TOP);
        if top < 1 || top > self.max_page_size {
            return Err(AppError::Validation(format!(
                "top must be between 1 and {}",
                self.max_page_size
            )));
        }

        debug!("Getting {} related articles for {}", top, url);

        let source = self
            .articles
            .find_by_url(url)
            .await?
            .ok_or_else(|| AppError::not_found("Article"))?;

        let vector = self.llm.embed(&source.embedding_text()).await?;
        // 多取一条，源文章通常是最近邻
        let hits: Vec<_> = self
            .engine
            .knn(vector, top + 1)
            .await?
            .into_iter()
            .filter(|hit| hit.url != source.url)
            .collect();

        let urls: Vec<String> = hits.iter().map(|hit| hit.url.clone()).collect();
        let articles = self.articles.find_by_urls(&urls).await?;

        Ok(hydrate_in_order(&hits, articles)
            .into_iter()
            .take(top as usize)
            .map(|(article, _)| ArticleResponse::from(article))
            .collect())
    }
}
