mod handler;

pub use handler::{block_user, unblock_user};
