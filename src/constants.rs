// ABOUTME: Application constants re-exported from courtline-core
// ABOUTME: Limits and defaults grouped by domain: accounts, booking, discounts, payments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use courtline_core::constants::*;
