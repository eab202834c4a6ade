//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token generation and validation.
//!
//! Tokens are issued by the identity service; this server only verifies
//! them. [`jwt::generate_access_token`] exists for tooling and tests.

pub mod jwt;
