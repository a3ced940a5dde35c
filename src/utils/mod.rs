//! # Utility Modules
//!
//! This module contains utility functions, constants, and validators used
//! throughout the Fundbridge application.
//!
//! ## Available Utilities
//!
//! - **Constants** (`constant`) - Application-wide configuration constants
//! - **Cookies** (`cookie`) - Building and reading the auth cookies
//! - **Pagination** (`pagination`) - Page-number pagination shared by listings
//! - **Secrets** (`secret`) - Reading secrets from files or env
//! - **Static objects** (`static_object`) - Lazily read environment configuration
//! - **Telemetry** (`telemetry`) - Tracing subscriber setup
//! - **Text** (`text`) - Small text helpers (tag lists, absolute URLs)
//! - **Validators** (`validator`) - Input validation utilities

pub mod constant;
pub mod cookie;
pub mod pagination;
pub mod secret;
pub mod static_object;
pub mod telemetry;
pub mod text;
pub mod validator;
