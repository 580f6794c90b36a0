/// Persistence layer
///
/// Users (credential store) and posts, plus the initial-data seed run
/// at startup. Uniqueness is enforced by database constraints, never
/// by check-then-insert in application code.

mod posts;
mod seed;
mod users;

pub use posts::create_post;
pub use posts::list_posts;
pub use posts::Post;
pub use seed::seed_initial_users;
pub use users::authenticate;
pub use users::create_user;
pub use users::get_user;
pub use users::list_users;
pub use users::Role;
pub use users::User;
