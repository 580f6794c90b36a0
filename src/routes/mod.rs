mod auth;
mod data;
mod health_check;

pub use auth::{login, logout, refresh, register};
pub use data::{create_post, get_data, get_profile};
pub use health_check::health_check;
