// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for production deployment

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::{info, warn};

use crate::constants::{accounts, booking, payments, ports};

/// JWT secret used when none is configured; refused in production
pub const DEVELOPMENT_JWT_SECRET: &str = "courtline-development-secret-change-me";

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Which payment gateway processes orders
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    /// Orders approve immediately without contacting a gateway
    #[default]
    Offline,
    /// `PayPal` REST API
    PayPal,
}

impl FromStr for PaymentProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            payments::PROVIDER_OFFLINE => Ok(Self::Offline),
            payments::PROVIDER_PAYPAL => Ok(Self::PayPal),
            other => bail!("Unknown PAYMENT_PROVIDER: {other}"),
        }
    }
}

/// Which email transport sends notifications
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    /// Emails are written to the log
    #[default]
    Log,
    /// Emails are posted to a transactional mail HTTP API
    Http,
}

impl FromStr for EmailProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "http" => Ok(Self::Http),
            other => bail!("Unknown EMAIL_PROVIDER: {other}"),
        }
    }
}

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Bind address
    pub host: String,
    /// Deployment environment
    pub environment: Environment,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Booking rules
    pub booking: BookingConfig,
    /// Payment gateway configuration
    pub payment: PaymentConfig,
    /// Email configuration
    pub email: EmailConfig,
    /// Calendar sync configuration
    pub calendar: CalendarConfig,
    /// HTTP server behaviour
    pub http: HttpConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite:./data/courtline.db`
    pub url: String,
    /// Maximum pooled connections (file databases only)
    pub max_connections: u32,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret, never serialized
    #[serde(skip_serializing, default)]
    pub jwt_secret: String,
    /// JWT expiry time in hours
    pub jwt_expiry_hours: i64,
    /// bcrypt work factor for password hashes
    pub bcrypt_cost: u32,
}

/// Booking rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Maximum pending sessions a user may hold at once
    pub max_pending_bookings: i64,
    /// Minimum minutes between now and a booked slot's start
    pub min_lead_minutes: i64,
}

/// Payment gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Active gateway
    pub provider: PaymentProvider,
    /// ISO 4217 currency code for all orders
    pub currency: String,
    /// `PayPal` API base URL
    pub paypal_base_url: String,
    /// `PayPal` client ID
    pub paypal_client_id: Option<String>,
    /// `PayPal` client secret, never serialized
    #[serde(skip_serializing, default)]
    pub paypal_client_secret: Option<String>,
    /// Where the buyer returns after approving an order
    pub return_url: Option<String>,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Active transport
    pub provider: EmailProvider,
    /// Mail API endpoint for the HTTP transport
    pub api_url: Option<String>,
    /// Mail API key, never serialized
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    /// Sender address
    pub from_address: String,
}

/// Calendar sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Webhook receiving session events; sync disabled when absent
    pub webhook_url: Option<String>,
}

/// HTTP server behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Comma-separated allowed origins, `*` for any
    pub cors_allowed_origins: String,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: ports::DEFAULT_HTTP_PORT,
            host: "0.0.0.0".to_owned(),
            environment: Environment::Development,
            database: DatabaseConfig {
                url: "sqlite:./data/courtline.db".to_owned(),
                max_connections: 5,
            },
            auth: AuthConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_owned(),
                jwt_expiry_hours: accounts::DEFAULT_TOKEN_EXPIRY_HOURS,
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            booking: BookingConfig {
                max_pending_bookings: booking::DEFAULT_MAX_PENDING_BOOKINGS,
                min_lead_minutes: booking::DEFAULT_MIN_LEAD_MINUTES,
            },
            payment: PaymentConfig {
                provider: PaymentProvider::Offline,
                currency: payments::DEFAULT_CURRENCY.to_owned(),
                paypal_base_url: payments::DEFAULT_PAYPAL_BASE_URL.to_owned(),
                paypal_client_id: None,
                paypal_client_secret: None,
                return_url: None,
            },
            email: EmailConfig {
                provider: EmailProvider::Log,
                api_url: None,
                api_key: None,
                from_address: "no-reply@courtline.local".to_owned(),
            },
            calendar: CalendarConfig { webhook_url: None },
            http: HttpConfig {
                cors_allowed_origins: "*".to_owned(),
                request_timeout_secs: 30,
                max_body_bytes: 1024 * 1024,
            },
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed, or if
    /// the resulting configuration fails [`ServerConfig::validate`]
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        let defaults = Self::default();

        let config = Self {
            http_port: parse_env_or("HTTP_PORT", defaults.http_port)?,
            host: env_var_or("HOST", &defaults.host),
            environment: Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development")),
            database: DatabaseConfig {
                url: env_var_or("DATABASE_URL", &defaults.database.url),
                max_connections: parse_env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
            },
            auth: AuthConfig {
                jwt_secret: env_var_or("JWT_SECRET", DEVELOPMENT_JWT_SECRET),
                jwt_expiry_hours: parse_env_or("JWT_EXPIRY_HOURS", defaults.auth.jwt_expiry_hours)?,
                bcrypt_cost: parse_env_or("BCRYPT_COST", defaults.auth.bcrypt_cost)?,
            },
            booking: BookingConfig {
                max_pending_bookings: parse_env_or(
                    "MAX_PENDING_BOOKINGS",
                    defaults.booking.max_pending_bookings,
                )?,
                min_lead_minutes: parse_env_or(
                    "MIN_BOOKING_LEAD_MINUTES",
                    defaults.booking.min_lead_minutes,
                )?,
            },
            payment: PaymentConfig {
                provider: env::var("PAYMENT_PROVIDER")
                    .ok()
                    .map(|v| v.parse())
                    .transpose()?
                    .unwrap_or_default(),
                currency: env_var_or("PAYMENT_CURRENCY", payments::DEFAULT_CURRENCY)
                    .to_uppercase(),
                paypal_base_url: env_var_or("PAYPAL_BASE_URL", payments::DEFAULT_PAYPAL_BASE_URL),
                paypal_client_id: env::var("PAYPAL_CLIENT_ID").ok(),
                paypal_client_secret: env::var("PAYPAL_CLIENT_SECRET").ok(),
                return_url: env::var("PAYMENT_RETURN_URL").ok(),
            },
            email: EmailConfig {
                provider: env::var("EMAIL_PROVIDER")
                    .ok()
                    .map(|v| v.parse())
                    .transpose()?
                    .unwrap_or_default(),
                api_url: env::var("EMAIL_API_URL").ok(),
                api_key: env::var("EMAIL_API_KEY").ok(),
                from_address: env_var_or("EMAIL_FROM", &defaults.email.from_address),
            },
            calendar: CalendarConfig {
                webhook_url: env::var("CALENDAR_WEBHOOK_URL").ok(),
            },
            http: HttpConfig {
                cors_allowed_origins: env_var_or(
                    "CORS_ALLOWED_ORIGINS",
                    &defaults.http.cors_allowed_origins,
                ),
                request_timeout_secs: parse_env_or(
                    "REQUEST_TIMEOUT_SECS",
                    defaults.http.request_timeout_secs,
                )?,
                max_body_bytes: parse_env_or("MAX_BODY_BYTES", defaults.http.max_body_bytes)?,
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error for settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.environment.is_production() && self.auth.jwt_secret == DEVELOPMENT_JWT_SECRET {
            bail!("JWT_SECRET must be set in production");
        }
        if self.auth.jwt_secret.len() < 16 {
            bail!("JWT_SECRET must be at least 16 characters");
        }
        if self.auth.jwt_expiry_hours <= 0 {
            bail!("JWT_EXPIRY_HOURS must be positive");
        }
        if !(accounts::MIN_BCRYPT_COST..=accounts::MAX_BCRYPT_COST).contains(&self.auth.bcrypt_cost)
        {
            bail!(
                "BCRYPT_COST must be between {} and {}",
                accounts::MIN_BCRYPT_COST,
                accounts::MAX_BCRYPT_COST
            );
        }
        if self.booking.max_pending_bookings <= 0 {
            bail!("MAX_PENDING_BOOKINGS must be positive");
        }
        if self.booking.min_lead_minutes < 0 {
            bail!("MIN_BOOKING_LEAD_MINUTES cannot be negative");
        }
        if self.payment.currency.len() != 3 {
            bail!("PAYMENT_CURRENCY must be a three-letter ISO 4217 code");
        }
        if self.payment.provider == PaymentProvider::PayPal
            && (self.payment.paypal_client_id.is_none()
                || self.payment.paypal_client_secret.is_none())
        {
            bail!("PAYMENT_PROVIDER=paypal requires PAYPAL_CLIENT_ID and PAYPAL_CLIENT_SECRET");
        }
        if self.email.provider == EmailProvider::Http && self.email.api_url.is_none() {
            bail!("EMAIL_PROVIDER=http requires EMAIL_API_URL");
        }
        if self.environment.is_production() && self.payment.provider == PaymentProvider::Offline {
            warn!("Offline payment provider is active in production; orders are auto-approved");
        }
        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Courtline Server Configuration:\n\
             - HTTP: {}:{}\n\
             - Environment: {}\n\
             - Database: {}\n\
             - JWT expiry: {}h\n\
             - Max pending bookings: {}\n\
             - Payment provider: {:?} ({})\n\
             - Email provider: {:?}\n\
             - Calendar sync: {}",
            self.host,
            self.http_port,
            self.environment,
            redact_database_url(&self.database.url),
            self.auth.jwt_expiry_hours,
            self.booking.max_pending_bookings,
            self.payment.provider,
            self.payment.currency,
            self.email.provider,
            if self.calendar.webhook_url.is_some() {
                "Enabled"
            } else {
                "Disabled"
            },
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}"))
    })
}

/// Hide credentials embedded in a database URL
fn redact_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_owned(),
    }
}
