//! 测试用的内存仓储

use super::{article::ArticleRepository, podcast::PodcastRepository, user::UserRepository};
use crate::{
    error::{AppError, Result},
    models::{
        article::{Article, ArticleFilter, ArticleSort},
        pagination::{PageRequest, Paginated},
        podcast::{Podcast, PodcastFilter},
        user::{NewUser, OneTimePasscode, User},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

fn paginate<T: Clone>(rows: &[T], page: PageRequest) -> Vec<T> {
    rows.iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect()
}

#[derive(Default)]
pub struct MemoryArticleRepository {
    articles: RwLock<Vec<Article>>,
}

impl MemoryArticleRepository {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            articles: RwLock::new(articles),
        }
    }

    pub async fn get(&self, id: &str) -> Option<Article> {
        self.articles
            .read()
            .await
            .iter()
            .find(|a| a.trending_id == id)
            .cloned()
    }
}

#[async_trait]
impl ArticleRepository for MemoryArticleRepository {
    async fn find_and_count(
        &self,
        filter: &ArticleFilter,
        sort: ArticleSort,
        page: PageRequest,
    ) -> Result<Paginated<Article>> {
        let mut matched: Vec<Article> = self
            .articles
            .read()
            .await
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        matched.sort_by(|a, b| sort.compare(a, b));

        Ok(Paginated {
            rows: paginate(&matched, page),
            count: matched.len() as i64,
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>> {
        Ok(self.get(id).await)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        Ok(self.articles.read().await.iter().find(|a| a.url == url).cloned())
    }

    async fn find_by_urls(&self, urls: &[String]) -> Result<Vec<Article>> {
        Ok(self
            .articles
            .read()
            .await
            .iter()
            .filter(|a| urls.contains(&a.url))
            .cloned()
            .collect())
    }

    async fn update_summary(&self, id: &str, summary: &str, analyzed_at: DateTime<Utc>) -> Result<()> {
        let mut articles = self.articles.write().await;
        if let Some(article) = articles.iter_mut().find(|a| a.trending_id == id) {
            article.summary = Some(summary.to_string());
            article.analyzed_date = Some(analyzed_at);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPodcastRepository {
    podcasts: Vec<Podcast>,
}

impl MemoryPodcastRepository {
    pub fn new(podcasts: Vec<Podcast>) -> Self {
        Self { podcasts }
    }
}

#[async_trait]
impl PodcastRepository for MemoryPodcastRepository {
    async fn find_and_count(&self, filter: &PodcastFilter, page: PageRequest) -> Result<Paginated<Podcast>> {
        let mut matched: Vec<Podcast> = self
            .podcasts
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        // None 排在最后
        matched.sort_by(|a, b| match (a.publish_date, b.publish_date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        Ok(Paginated {
            rows: paginate(&matched, page),
            count: matched.len() as i64,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Podcast>> {
        Ok(self.podcasts.iter().find(|p| p.podcast_id == id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_by_email(&self, email: &str) -> Option<User> {
        self.users.read().await.iter().find(|u| u.email == email).cloned()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.get_by_email(email).await)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(AppError::conflict("Email or username already registered"));
        }

        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            otp: None,
            created_at: Utc::now(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.email == email) {
            user.password_hash = password_hash.to_string();
            user.otp = None;
        }
        Ok(())
    }

    async fn update_otp(&self, email: &str, otp: &OneTimePasscode) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.email == email) {
            user.otp = Some(otp.clone());
        }
        Ok(())
    }
}
