/// Middleware module
///
/// The authentication gate for protected routes and request logging.

mod auth_gate;
mod request_logging;

pub use auth_gate::admit;
pub use auth_gate::AuthGate;
pub use request_logging::RequestLogger;
