pub mod auth;
pub mod block;
mod extract;
pub mod user;

pub use extract::{ApiJson, ApiPath, ApiQuery};
