// ABOUTME: Centralized resource container for dependency injection
// ABOUTME: Holds the database, auth, config and external integrations shared by every handler
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources
//!
//! Built once at startup and shared as `Arc<ServerResources>` router state.
//! External integrations are trait objects so tests can substitute doubles.

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::AppResult;
use crate::external::{
    calendar_sync_from_config, email_sender_from_config, payment_gateway_from_config,
    CalendarSync, EmailSender, PaymentGateway,
};
use crate::middleware::AuthMiddleware;

/// External integrations used by the services
#[derive(Clone)]
pub struct Integrations {
    /// Payment processor
    pub payment_gateway: Arc<dyn PaymentGateway>,
    /// Email transport
    pub email_sender: Arc<dyn EmailSender>,
    /// Calendar backend
    pub calendar: Arc<dyn CalendarSync>,
}

impl Integrations {
    /// Build the integrations selected by configuration
    ///
    /// # Errors
    ///
    /// Returns a config error if a selected provider is missing its settings
    pub fn from_config(config: &ServerConfig) -> AppResult<Self> {
        Ok(Self {
            payment_gateway: payment_gateway_from_config(config)?,
            email_sender: email_sender_from_config(config)?,
            calendar: calendar_sync_from_config(config)?,
        })
    }
}

/// Shared server state
#[derive(Clone)]
pub struct ServerResources {
    /// Persistence layer
    pub database: Arc<Database>,
    /// Token issuing and password hashing
    pub auth_manager: Arc<AuthManager>,
    /// Request authentication
    pub auth_middleware: Arc<AuthMiddleware>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Payment processor
    pub payment_gateway: Arc<dyn PaymentGateway>,
    /// Email transport
    pub email_sender: Arc<dyn EmailSender>,
    /// Calendar backend
    pub calendar: Arc<dyn CalendarSync>,
}

impl ServerResources {
    /// Assemble server resources
    #[must_use]
    pub fn new(
        database: Database,
        auth_manager: AuthManager,
        config: Arc<ServerConfig>,
        integrations: Integrations,
    ) -> Self {
        let database = Arc::new(database);
        let auth_manager = Arc::new(auth_manager);
        let auth_middleware = Arc::new(AuthMiddleware::new(
            Arc::clone(&auth_manager),
            Arc::clone(&database),
        ));

        Self {
            database,
            auth_manager,
            auth_middleware,
            config,
            payment_gateway: integrations.payment_gateway,
            email_sender: integrations.email_sender,
            calendar: integrations.calendar,
        }
    }
}
