//! # auth-adapters
//!
//! Implementations of the identity-side ports: password hashing, one-time
//! codes for email verification, the log-only mailer, and (behind the
//! `auth-jwt` feature) the JWT credential service.

pub mod mailer;
pub mod otp;
pub mod password;

#[cfg(feature = "auth-jwt")]
pub mod jwt;

pub use mailer::LogNotifier;
pub use otp::OtpStore;

#[cfg(feature = "auth-jwt")]
pub use jwt::JwtCredentialService;
