// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Limits, defaults and service names shared by the server and its tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants grouped by domain.

/// Service identity
pub mod service_names {
    /// Service name used in logs and health responses
    pub const COURTLINE_SERVER: &str = "courtline-server";
    /// JWT audience claim
    pub const JWT_AUDIENCE: &str = "courtline-api";
}

/// Network defaults
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8080;
}

/// Account rules
pub mod accounts {
    /// Minimum password length
    pub const MIN_PASSWORD_LENGTH: usize = 8;
    /// Maximum display name length
    pub const MAX_DISPLAY_NAME_LENGTH: usize = 100;
    /// Maximum coach bio length
    pub const MAX_BIO_LENGTH: usize = 2000;
    /// Default JWT lifetime
    pub const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;
    /// Lowest bcrypt work factor accepted
    pub const MIN_BCRYPT_COST: u32 = 4;
    /// Highest bcrypt work factor accepted
    pub const MAX_BCRYPT_COST: u32 = 31;
}

/// Booking rules
pub mod booking {
    /// Default cap on a user's simultaneously pending sessions
    pub const DEFAULT_MAX_PENDING_BOOKINGS: i64 = 3;
    /// Default minimum time between booking and slot start
    pub const DEFAULT_MIN_LEAD_MINUTES: i64 = 0;
    /// Shortest booking type / custom service
    pub const MIN_DURATION_MINUTES: i64 = 15;
    /// Longest booking type / custom service
    pub const MAX_DURATION_MINUTES: i64 = 480;
    /// Longest single time slot
    pub const MAX_SLOT_HOURS: i64 = 12;
    /// Most slots accepted by one bulk request
    pub const MAX_BULK_SLOTS: usize = 100;
    /// Longest session notes accepted
    pub const MAX_NOTES_LENGTH: usize = 1000;
    /// Longest offering name
    pub const MAX_NAME_LENGTH: usize = 120;
    /// Highest price an offering may carry ($1,000,000)
    pub const MAX_PRICE_CENTS: i64 = 100_000_000;
}

/// Discount code rules
pub mod discounts {
    /// Shortest discount code
    pub const MIN_CODE_LENGTH: usize = 3;
    /// Longest discount code
    pub const MAX_CODE_LENGTH: usize = 32;
    /// Largest percentage discount
    pub const MAX_PERCENTAGE: i64 = 100;
}

/// Chat rules
pub mod messaging {
    /// Longest message body
    pub const MAX_MESSAGE_LENGTH: usize = 2000;
    /// Characters of the last message shown in conversation lists
    pub const PREVIEW_LENGTH: usize = 80;
}

/// Payment defaults
pub mod payments {
    /// Currency used when none is configured
    pub const DEFAULT_CURRENCY: &str = "USD";
    /// Offline provider name
    pub const PROVIDER_OFFLINE: &str = "offline";
    /// `PayPal` provider name
    pub const PROVIDER_PAYPAL: &str = "paypal";
    /// Default `PayPal` API base URL (sandbox)
    pub const DEFAULT_PAYPAL_BASE_URL: &str = "https://api-m.sandbox.paypal.com";
}

/// Outbound HTTP limits for gateway, email and calendar calls
pub mod external {
    /// TCP connect timeout
    pub const CONNECT_TIMEOUT_SECS: u64 = 5;
    /// Whole-request timeout
    pub const REQUEST_TIMEOUT_SECS: u64 = 20;
}

/// Pagination defaults
pub mod pagination {
    /// Default page size
    pub const DEFAULT_LIMIT: i64 = 20;
    /// Largest page size a client may request
    pub const MAX_LIMIT: i64 = 100;
}

/// Analytics defaults
pub mod analytics {
    /// Default number of months in revenue series
    pub const DEFAULT_REVENUE_MONTHS: u32 = 6;
    /// Largest revenue series window
    pub const MAX_REVENUE_MONTHS: u32 = 24;
    /// Number of booking types listed as "top"
    pub const TOP_BOOKING_TYPES: i64 = 5;
}
