use crate::{
    services::{
        article::ArticleService, auth::AuthService, podcast::PodcastService, search::SearchService,
        user::UserService,
    },
};
use std::sync::Arc;

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 文章服务
    pub article_service: ArticleService,

    /// 播客服务
    pub podcast_service: PodcastService,

    /// 搜索服务
    pub search_service: SearchService,

    /// 用户服务
    pub user_service: UserService,

    /// 认证服务，同时以 Extension 形式提供给认证提取器
    pub auth_service: Arc<AuthService>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::{
        config::Config,
        models::{article::Article, podcast::Podcast},
        repositories::{
            memory::{MemoryArticleRepository, MemoryPodcastRepository, MemoryUserRepository},
            CacheTokenStore,
        },
        services::{llm::MockLanguageModel, mail::MockMailer, search::MockSearchEngine},
    };

    /// 基于内存仓储与 mock 外部服务的状态
    pub struct TestStateBuilder {
        pub articles: Vec<Article>,
        pub podcasts: Vec<Podcast>,
        pub llm: MockLanguageModel,
        pub engine: MockSearchEngine,
        pub mailer: MockMailer,
    }

    impl Default for TestStateBuilder {
        fn default() -> Self {
            Self {
                articles: Vec::new(),
                podcasts: Vec::new(),
                llm: MockLanguageModel::new(),
                engine: MockSearchEngine::new(),
                mailer: MockMailer::new(),
            }
        }
    }

    impl TestStateBuilder {
        pub fn build(self) -> Arc<AppState> {
            let config = Config::default();
            let articles = Arc::new(MemoryArticleRepository::new(self.articles));
            let podcasts = Arc::new(MemoryPodcastRepository::new(self.podcasts));
            let users = Arc::new(MemoryUserRepository::new());
            let tokens = Arc::new(CacheTokenStore::new());
            let engine = Arc::new(self.engine);
            let llm = Arc::new(self.llm);

            Arc::new(AppState {
                article_service: ArticleService::new(articles.clone(), llm, engine.clone(), &config),
                podcast_service: PodcastService::new(podcasts, &config),
                search_service: SearchService::new(engine, articles, &config),
                user_service: UserService::new(users.clone()),
                auth_service: Arc::new(AuthService::new(users, tokens, Arc::new(self.mailer), &config)),
            })
        }
    }
}
