pub mod article;
pub mod auth;
pub mod database;
pub mod llm;
pub mod mail;
pub mod podcast;
pub mod search;
pub mod user;

// 重新导出常用类型
pub use article::ArticleService;
pub use auth::AuthService;
pub use database::Database;
pub use podcast::PodcastService;
pub use search::SearchService;
pub use user::UserService;
