//! # Business Logic Services
//!
//! Services encapsulate the domain rules and are called by the HTTP handlers.
//!
//! ## Available Services
//!
//! - **Email** (`email`) - Email delivery service with multiple implementations
//! - **JWT** (`jwt`) - Access/refresh token creation, validation and the logout blacklist
//! - **Password** (`password`) - Argon2 hashing off the async runtime
//! - **Registration** (`registration`) - Sign-up validation and account creation
//! - **Throttle** (`throttle`) - Fixed-window login throttling
//! - **Verification** (`verification`) - Email verification links

pub mod email;
pub mod jwt;
pub mod password;
pub mod registration;
pub mod throttle;
pub mod verification;
