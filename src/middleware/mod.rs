// Middleware modules: JWT validation and CORS

pub mod auth;
pub mod auth_middleware;
pub mod cors;

pub use auth::AuthenticatedUser;
pub use auth_middleware::{auth_middleware, optional_auth_middleware, MaybeUser};
pub use cors::dynamic_cors_middleware;
