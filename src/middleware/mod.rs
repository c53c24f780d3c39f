pub mod auth;
pub mod upload_gate;

pub use auth::{require_auth, AuthUser};
pub use upload_gate::upload_gate;
