//! # HTTP Request Handlers
//!
//! Each handler processes one route and returns a JSON response.
//!
//! ## Available Handlers
//!
//! - **Authentication** (`auth`) - Registration, email verification, login, refresh and logout
//! - **Health Check** (`health_check`) - Liveness and database reachability
//! - **Notifications** (`notifications`) - The investor inbox
//! - **Projects** (`projects`) - Project lookup and creation
//! - **Startups** (`startups`) - Public startup profile and its projects

mod auth;
mod health_check;
mod notifications;
mod projects;
mod startups;

pub use auth::*;
pub use health_check::*;
pub use notifications::*;
pub use projects::*;
pub use startups::*;
