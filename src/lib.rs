// ABOUTME: Main library entry point for the Courtline tennis coaching booking API
// ABOUTME: Wires configuration, persistence, services and HTTP routes into one server crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Courtline Server
//!
//! REST API where players book tennis coaching sessions with coaches.
//!
//! ## Architecture
//!
//! - **Routes**: thin axum handlers, one router per resource
//! - **Services**: business rules and authorization
//! - **Database**: SQLite persistence through sqlx
//! - **External**: payment gateway, email and calendar integrations behind traits
//!
//! Domain types, errors and pure pricing/scheduling rules live in the
//! `courtline-core` crate and are re-exported here.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use courtline_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     config.validate()?;
//!     println!("Courtline configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// JWT issuing/validation and password hashing
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// Application constants
pub mod constants;

/// SQLite persistence
pub mod database;

/// Unified error handling
pub mod errors;

/// Payment, email and calendar integrations
pub mod external;

/// Structured logging setup
pub mod logging;

/// HTTP middleware: authentication, CORS and request tracing
pub mod middleware;

/// Domain models
pub mod models;

/// Limit/offset pagination
pub mod pagination;

/// Shared server state
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// HTTP server assembly
pub mod server;

/// Business logic
pub mod services;

pub use courtline_core::{pricing, schedule};
