use crate::{
    error::Result,
    models::{
        article::{ArticleResponse, CategoryQuery, RelatedQuery, TrendingQuery},
        pagination::{DateRangeQuery, ListResponse, PaginationQuery},
        search::{SearchQuery, SearchResponse},
    },
    state::AppState,
    utils::extract::ApiQuery,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_articles))
        .route("/time", get(get_articles_between_dates))
        .route("/categories", get(get_articles_by_category))
        .route("/search", get(search_articles))
        .route("/trending", get(get_trending_articles))
        .route("/related", get(get_related_articles))
        .route("/:id", get(get_article))
}

/// 获取文章列表
/// GET /articles
pub async fn list_articles(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PaginationQuery>,
) -> Result<Json<ListResponse<ArticleResponse>>> {
    debug!("Fetching articles list with query: {:?}", query);
    let result = app_state.article_service.get_all_articles(&query).await?;
    Ok(Json(result))
}

/// GET /articles/time?startTime=&endTime=
pub async fn get_articles_between_dates(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<Json<ListResponse<ArticleResponse>>> {
    let result = app_state.article_service.get_articles_between_dates(&query).await?;
    Ok(Json(result))
}

/// GET /articles/categories?category=
pub async fn get_articles_by_category(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> Result<Json<ListResponse<ArticleResponse>>> {
    let result = app_state.article_service.get_articles_by_category(&query).await?;
    Ok(Json(result))
}

/// 全文搜索
/// GET /articles/search?q=&page=&size=
pub async fn search_articles(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    debug!("Searching articles with query: {:?}", query);
    let result = app_state.search_service.search_articles(&query).await?;
    Ok(Json(result))
}

/// 获取热门文章
/// GET /articles/trending?category=&minScore=
pub async fn get_trending_articles(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TrendingQuery>,
) -> Result<Json<ListResponse<ArticleResponse>>> {
    let result = app_state.article_service.get_trending_articles(&query).await?;
    Ok(Json(result))
}

/// GET /articles/related?url=&top=
pub async fn get_related_articles(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<RelatedQuery>,
) -> Result<Json<Vec<ArticleResponse>>> {
    let result = app_state.article_service.get_related_articles(&query).await?;
    Ok(Json(result))
}

/// GET /articles/:id
pub async fn get_article(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ArticleResponse>> {
    let article = app_state.article_service.get_article_by_id(&id).await?;
    Ok(Json(article))
}

#[cfg(test)]
mod tests {
    use crate::models::search::{SearchHit, SearchHits};
    use crate::routes::{create_router, test_support::get_json};
    use crate::services::article::tests::article;
    use crate::state::test_support::TestStateBuilder;
    use axum::http::StatusCode;

    fn builder() -> TestStateBuilder {
        TestStateBuilder {
            articles: (0..25).map(|d| article(d, (d % 5) as f64 / 5.0, if d % 2 == 0 { "Tech" } else { "World" })).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_envelope() {
        let app = create_router(builder().build());
        let (status, body) = get_json(app, "/articles?page=3&pageSize=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 25);
        assert_eq!(body["page"], 3);
        assert_eq!(body["pageSize"], 10);
        assert_eq!(body["items"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_empty_params_use_defaults() {
        let app = create_router(builder().build());
        let (status, body) = get_json(app, "/articles?page=&pageSize=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pageSize"], 10);
    }

    #[tokio::test]
    async fn test_page_size_over_limit_is_bad_request() {
        let app = create_router(builder().build());
        let (status, body) = get_json(app, "/articles?pageSize=1000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_page_uses_error_body() {
        let app = create_router(builder().build());
        let (status, body) = get_json(app, "/articles?page=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("invalid digit"));
    }

    #[tokio::test]
    async fn test_missing_start_time_uses_error_body() {
        let app = create_router(builder().build());
        let (status, body) = get_json(app, "/articles/time?endTime=2024-01-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("startTime"));
    }

    #[tokio::test]
    async fn test_time_and_category_routes() {
        let state = builder().build();
        let (status, body) = get_json(
            create_router(state.clone()),
            "/articles/time?startTime=2024-01-01&endTime=2024-01-03",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);

        let (status, body) = get_json(create_router(state), "/articles/categories?category=Tech").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 13);
    }

    #[tokio::test]
    async fn test_trending_route_orders_by_score() {
        let app = create_router(builder().build());
        let (status, body) = get_json(app, "/articles/trending?minScore=0.6&pageSize=50").await;
        assert_eq!(status, StatusCode::OK);
        let scores: Vec<f64> = body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["similarity_score"].as_f64().unwrap())
            .collect();
        assert_eq!(scores.len(), 10);
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_unknown_article_is_404() {
        let app = create_router(builder().build());
        let (status, body) = get_json(app, "/articles/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_search_route() {
        let mut builder = builder();
        builder.engine.expect_search().returning(|_, _, _| {
            Ok(SearchHits {
                total: 1,
                hits: vec![SearchHit {
                    url: "https://news.example.com/7".to_string(),
                    score: 3.5,
                }],
            })
        });
        let app = create_router(builder.build());

        let (status, body) = get_json(app, "/articles/search?q=story").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["size"], 20);
        assert_eq!(body["results"][0]["trending_id"], "trend-7");
        assert_eq!(body["results"][0]["score"], 3.5);
    }

    #[tokio::test]
    async fn test_search_without_query_is_bad_request() {
        let app = create_router(builder().build());
        let (status, _) = get_json(app, "/articles/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
