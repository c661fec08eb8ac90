// ABOUTME: Re-exports the unified error types from courtline-core
// ABOUTME: Server modules use crate::errors so every layer shares one AppError type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use courtline_core::errors::*;
