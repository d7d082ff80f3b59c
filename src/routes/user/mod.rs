mod handler;
mod model;

pub use handler::{create_user, find_all, find_one, remove_user, search, update_user};
pub use model::{CreateUserRequest, DeleteUserResponse, SearchQuery, UpdateUserRequest};
