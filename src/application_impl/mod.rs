mod auth_service_impl;
mod follow_service_impl;
mod password_hasher_argon2;
mod post_service_impl;
mod token_issuer_jwt;
mod user_service_impl;

pub use auth_service_impl::*;
pub use follow_service_impl::*;
pub use password_hasher_argon2::*;
pub use post_service_impl::*;
pub use token_issuer_jwt::*;
pub use user_service_impl::*;
