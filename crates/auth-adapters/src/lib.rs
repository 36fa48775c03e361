//! # auth-adapters
//!
//! Credential hashing (Argon2id) and, behind `auth-jwt`, HS256 bearer tokens.

mod password;

#[cfg(feature = "auth-jwt")]
mod jwt;

pub use password::Argon2Hasher;

#[cfg(feature = "auth-jwt")]
pub use jwt::JwtTokenService;
