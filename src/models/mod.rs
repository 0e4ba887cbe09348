pub mod article;
pub mod auth;
pub mod pagination;
pub mod playback;
pub mod podcast;
pub mod response;
pub mod search;
pub mod user;
