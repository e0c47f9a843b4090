//! HTTP exposition
//!
//! - `server`: routes, listener binding and graceful shutdown
//! - `auth`: Keystone token middleware for the scrape routes

pub mod auth;
pub mod server;

pub use server::{bind, router, serve, AppState, TEXT_FORMAT};
