pub mod cache;
pub mod extract;
pub mod serde_helpers;
pub mod validation;
