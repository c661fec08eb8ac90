// ABOUTME: Domain models for the Courtline coaching booking platform
// ABOUTME: Users, offerings, time slots, sessions, discounts, payments and chat records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain models shared by the database layer, services and routes.
//!
//! Money is always an integer amount of minor currency units (cents).

mod conversation;
mod custom_service;
mod discount;
mod offering;
mod payment;
mod session;
mod user;

pub use conversation::{Conversation, ConversationSummary, Message, MessageKind};
pub use custom_service::CustomService;
pub use discount::{Discount, DiscountKind};
pub use offering::{BookingType, TimeSlot};
pub use payment::{Payment, PaymentRecordStatus};
pub use session::{PaymentStatus, Session, SessionStatus};
pub use user::{PublicProfile, User, UserRole};

use crate::errors::AppError;

/// Error for an enum value read from storage or input that is not recognised
pub(crate) fn unknown_variant(kind: &str, value: &str) -> AppError {
    AppError::invalid_input(format!("Unknown {kind}: {value}"))
}
