//! Authentication and authorization

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use jwt::{Claims, TokenCodec, TOKEN_LIFETIME_DAYS};
pub use middleware::{authenticate, parse_bearer, require_auth, require_manager, CurrentUser};
pub use models::{Identity, LoginRequest, LoginResponse, UserRole};
pub use password::{hash_password, verify_password};
