use axum::http::{HeaderValue, Method};
use std::sync::Arc;
use tokio::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod models;
mod repositories;
mod routes;
mod services;
mod state;
mod utils;

use crate::{
    config::Config,
    repositories::{
        CacheTokenStore, PgArticleRepository, PgPodcastRepository, PgUserRepository, RefreshTokenStore,
    },
    services::{
        llm::OpenAiClient, mail::SmtpMailer, search::ElasticsearchClient, ArticleService, AuthService,
        Database, PodcastService, SearchService, UserService,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 初始化日志，生产环境输出 JSON
    let filter = tracing_subscriber::EnvFilter::new(&config.log_level);
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting Newscast service ({})...", config.environment);

    // 初始化数据库连接
    let db = Database::new(&config).await?;
    db.verify_connection().await?;
    info!("Database connection established successfully");

    let articles = Arc::new(PgArticleRepository::new(db.pool.clone()));
    let podcasts = Arc::new(PgPodcastRepository::new(db.pool.clone()));
    let users = Arc::new(PgUserRepository::new(db.pool.clone()));
    let tokens = refresh_token_store(&config).await?;

    let engine = Arc::new(ElasticsearchClient::new(&config)?);
    let llm = Arc::new(OpenAiClient::new(&config)?);
    let mailer = Arc::new(SmtpMailer::new(&config)?);

    // 创建应用状态
    let app_state = Arc::new(AppState {
        article_service: ArticleService::new(articles.clone(), llm, engine.clone(), &config),
        podcast_service: PodcastService::new(podcasts, &config),
        search_service: SearchService::new(engine, articles, &config),
        user_service: UserService::new(users.clone()),
        auth_service: Arc::new(AuthService::new(users, tokens, mailer, &config)),
    });

    // 配置 CORS
    let origins = config
        .cors_allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(origins);

    let app = routes::create_router(app_state)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

/// 配置了 Redis 时使用 Redis，否则退回进程内缓存
async fn refresh_token_store(config: &Config) -> anyhow::Result<Arc<dyn RefreshTokenStore>> {
    #[cfg(feature = "redis-cache")]
    if let Some(url) = &config.redis_url {
        let store = repositories::RedisTokenStore::connect(url).await?;
        info!("Refresh tokens stored in Redis");
        return Ok(Arc::new(store));
    }

    if config.redis_url.is_some() {
        warn!("REDIS_URL is set but the redis-cache feature is disabled, using in-process cache");
    }

    let store = CacheTokenStore::new();
    store.cache().spawn_cleanup(Duration::from_secs(3600));
    info!("Refresh tokens stored in process memory");
    Ok(Arc::new(store))
}
