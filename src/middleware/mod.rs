//! # Middleware Components
//!
//! Request processing shared by several routes: authentication and client
//! identification.

pub mod auth;
pub mod client_ip;

pub use auth::{AuthUser, auth_middleware};
pub use client_ip::ClientIp;
