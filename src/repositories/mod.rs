pub mod article;
pub mod podcast;
pub mod token;
pub mod user;

#[cfg(test)]
pub mod memory;

pub use article::{ArticleRepository, PgArticleRepository};
pub use podcast::{PgPodcastRepository, PodcastRepository};
pub use token::{CacheTokenStore, RefreshTokenStore};
pub use user::{PgUserRepository, UserRepository};

#[cfg(feature = "redis-cache")]
pub use token::RedisTokenStore;
