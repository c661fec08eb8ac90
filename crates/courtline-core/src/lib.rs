// ABOUTME: Core types and business rules for the Courtline coaching booking platform
// ABOUTME: Foundation crate with error handling, domain models, pricing and scheduling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Courtline Core
//!
//! Foundation crate shared by the Courtline server. It holds the pieces that
//! change rarely and carry no I/O:
//!
//! - **errors**: `AppError`, `ErrorCode` and the HTTP error envelope
//! - **models**: users, booking types, time slots, sessions, discounts,
//!   payments, conversations and custom services
//! - **pricing**: discount validation and price quotes
//! - **schedule**: time slot interval rules
//! - **pagination**: limit/offset paging helpers
//! - **constants**: limits and defaults used across the platform

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and defaults organized by domain
pub mod constants;

/// Domain models for the booking platform
pub mod models;

/// Discount validation and price calculation
pub mod pricing;

/// Time slot interval validation
pub mod schedule;

/// Limit/offset pagination helpers
pub mod pagination;
