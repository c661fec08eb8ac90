// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Re-exports the environment-driven ServerConfig and its sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration for the Courtline server.
//!
//! Everything is read from environment variables once at startup by
//! [`ServerConfig::from_env`]; the binary may override the port and database
//! URL from the command line afterwards.

/// Environment and server configuration
pub mod environment;

pub use environment::{
    AuthConfig, BookingConfig, CalendarConfig, DatabaseConfig, EmailConfig, EmailProvider,
    Environment, HttpConfig, PaymentConfig, PaymentProvider, ServerConfig,
    DEVELOPMENT_JWT_SECRET,
};
