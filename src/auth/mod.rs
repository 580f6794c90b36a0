/// Authentication module
///
/// Handles JWT token issuance/validation, password hashing, and the
/// in-memory revocation registry.

mod claims;
mod jwt;
mod password;
mod revocation;

pub use claims::Claims;
pub use claims::TokenKind;
pub use jwt::issue_access_token;
pub use jwt::issue_refresh_token;
pub use jwt::validate_access_token;
pub use jwt::validate_refresh_token;
pub use password::hash_password;
pub use password::verify_password;
pub use password::DUMMY_HASH;
pub use revocation::RevocationRegistry;
