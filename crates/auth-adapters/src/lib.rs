//! # auth-adapters
//!
//! Identity collaborators: argon2-backed credential verification and account
//! creation, admin bootstrap, and (behind `auth-jwt`) HS256 bearer tokens.

pub mod bootstrap;
#[cfg(feature = "auth-jwt")]
pub mod jwt;
pub mod password;

pub use bootstrap::{ensure_admin, AdminSeed};
#[cfg(feature = "auth-jwt")]
pub use jwt::JwtTokenService;
pub use password::PasswordIdentityProvider;
