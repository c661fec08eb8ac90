// ABOUTME: Domain service layer holding the booking platform's business rules
// ABOUTME: Route handlers stay thin and delegate validation and persistence here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! Services take the database (or the full `ServerResources` when they talk
//! to integrations) plus the authenticated caller, and return `AppResult`.
//! Authorization checks live here, not in the routes.

/// Registration, login, profiles and account administration
pub mod accounts;

/// Coach, player and platform dashboards
pub mod analytics;

/// Session booking and lifecycle
pub mod booking;

/// Coach booking types
pub mod booking_types;

/// Ad-hoc coach offerings sent through chat
pub mod custom_services;

/// Discount codes and price quotes
pub mod discounts;

/// Player and coach conversations
pub mod messaging;

/// Background email and calendar delivery
pub mod notifications;

/// Checkout, capture and refunds
pub mod payments;

/// Coach availability
pub mod time_slots;
