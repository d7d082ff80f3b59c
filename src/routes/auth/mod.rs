mod handler;
mod model;

pub use handler::get_token;
pub use model::{TokenQuery, TokenResponse};
