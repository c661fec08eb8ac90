// ABOUTME: Domain models re-exported from courtline-core
// ABOUTME: Users, offerings, sessions, discounts, payments and chat records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use courtline_core::models::*;
