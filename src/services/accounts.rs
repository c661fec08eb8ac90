// ABOUTME: Account business logic: registration, login, profiles and admin status changes
// ABOUTME: Validates credentials and profile input before touching the users table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthManager;
use crate::constants::accounts::{MAX_BIO_LENGTH, MAX_DISPLAY_NAME_LENGTH, MIN_PASSWORD_LENGTH};
use crate::database::{Database, ProfileUpdate};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::{BookingType, PublicProfile, User, UserRole};
use crate::pagination::{Page, PageParams};

/// Registration input
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Name shown to others
    pub display_name: String,
    /// `user` (default) or `coach`
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Login input
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Profile changes; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name
    pub display_name: Option<String>,
    /// New coach biography
    pub bio: Option<String>,
    /// New coach hourly rate
    pub hourly_rate_cents: Option<i64>,
}

/// An account together with a freshly issued token
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    /// The account
    pub user: User,
    /// Bearer token
    pub token: String,
    /// Token expiry
    pub expires_at: DateTime<Utc>,
}

/// Public coach profile with active booking types
#[derive(Debug, Clone, Serialize)]
pub struct CoachProfile {
    /// Coach profile
    #[serde(flatten)]
    pub profile: PublicProfile,
    /// Bookable offerings
    pub booking_types: Vec<BookingType>,
}

/// Check that an email address is plausibly deliverable
///
/// # Errors
///
/// Returns `InvalidInput` when the address is malformed
pub fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    }) && !email.chars().any(char::is_whitespace);

    if valid {
        Ok(())
    } else {
        Err(AppError::invalid_input("Invalid email address"))
    }
}

/// Check password strength
///
/// # Errors
///
/// Returns `InvalidInput` when the password is too short
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn normalize_display_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_input("Display name cannot be empty"));
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Display name cannot exceed {MAX_DISPLAY_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_owned())
}

fn issue(auth_manager: &AuthManager, user: User) -> AppResult<AuthSession> {
    let issued = auth_manager.generate_token(&user)?;
    Ok(AuthSession {
        user,
        token: issued.token,
        expires_at: issued.expires_at,
    })
}

/// Register a player or coach account
///
/// # Errors
///
/// Returns `InvalidInput` for bad input or a self-assigned admin role and
/// `ResourceAlreadyExists` for a taken email
#[tracing::instrument(skip(database, auth_manager, request), fields(email = %request.email))]
pub async fn register(
    database: &Database,
    auth_manager: &AuthManager,
    request: RegisterRequest,
) -> AppResult<AuthSession> {
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    let display_name = normalize_display_name(&request.display_name)?;

    let role = request.role.unwrap_or(UserRole::User);
    if role.is_admin() {
        return Err(AppError::invalid_input("The admin role cannot be self-assigned"));
    }

    if database.get_user_by_email(&request.email).await?.is_some() {
        return Err(AppError::already_exists(
            "An account with this email already exists",
        ));
    }

    let password_hash = auth_manager.hash_password(&request.password).await?;
    let user = User::new(&request.email, password_hash, display_name, role);
    database.create_user(&user).await?;

    info!(user_id = %user.id, role = %user.role, "Account registered");
    AppLogger::log_auth_event(&user.id.to_string(), "register", true);
    issue(auth_manager, user)
}

/// Exchange credentials for a token
///
/// # Errors
///
/// Returns `AuthInvalid` for unknown email or wrong password and
/// `PermissionDenied` for a deactivated account
#[tracing::instrument(skip(database, auth_manager, request), fields(email = %request.email))]
pub async fn login(
    database: &Database,
    auth_manager: &AuthManager,
    request: LoginRequest,
) -> AppResult<AuthSession> {
    let invalid = || AppError::auth_invalid("Invalid email or password");

    let user = database
        .get_user_by_email(&request.email)
        .await?
        .ok_or_else(invalid)?;

    if !auth_manager
        .verify_password(&request.password, &user.password_hash)
        .await?
    {
        warn!(user_id = %user.id, "Login with wrong password");
        AppLogger::log_auth_event(&user.id.to_string(), "login", false);
        return Err(invalid());
    }
    if !user.is_active {
        AppLogger::log_auth_event(&user.id.to_string(), "login", false);
        return Err(AppError::forbidden("Account is deactivated"));
    }

    AppLogger::log_auth_event(&user.id.to_string(), "login", true);
    issue(auth_manager, user)
}

/// Issue a new token for an authenticated account
///
/// # Errors
///
/// Returns an internal error if signing fails
pub fn refresh(auth_manager: &AuthManager, user: User) -> AppResult<AuthSession> {
    AppLogger::log_auth_event(&user.id.to_string(), "refresh", true);
    issue(auth_manager, user)
}

/// Update the caller's profile
///
/// # Errors
///
/// Returns `InvalidInput` for bad values or coach-only fields on a non-coach
pub async fn update_profile(
    database: &Database,
    user: &User,
    request: UpdateProfileRequest,
) -> AppResult<User> {
    let display_name = request
        .display_name
        .as_deref()
        .map(normalize_display_name)
        .transpose()?;

    if !user.role.is_coach() && (request.bio.is_some() || request.hourly_rate_cents.is_some()) {
        return Err(AppError::invalid_input(
            "Only coaches have a bio and hourly rate",
        ));
    }
    let bio = request.bio.map(|bio| bio.trim().to_owned());
    if bio
        .as_ref()
        .is_some_and(|bio| bio.chars().count() > MAX_BIO_LENGTH)
    {
        return Err(AppError::invalid_input(format!(
            "Bio cannot exceed {MAX_BIO_LENGTH} characters"
        )));
    }
    if request.hourly_rate_cents.is_some_and(|rate| rate < 0) {
        return Err(AppError::out_of_range("Hourly rate cannot be negative"));
    }

    database
        .update_user_profile(
            user.id,
            &ProfileUpdate {
                display_name,
                bio,
                hourly_rate_cents: request.hourly_rate_cents,
            },
        )
        .await
}

/// Active coaches, newest first
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn list_coaches(database: &Database, page: &PageParams) -> AppResult<Page<PublicProfile>> {
    let (coaches, total) = database
        .list_users(Some(UserRole::Coach), true, page.limit(), page.offset())
        .await?;
    Ok(Page::new(
        coaches.iter().map(User::public_profile).collect(),
        total,
        page,
    ))
}

/// Load an active coach
///
/// # Errors
///
/// Returns `ResourceNotFound` unless `coach_id` is an active coach
pub async fn require_active_coach(database: &Database, coach_id: Uuid) -> AppResult<User> {
    database
        .get_user(coach_id)
        .await?
        .filter(|user| user.role.is_coach() && user.is_active)
        .ok_or_else(|| AppError::not_found("Coach"))
}

/// Public coach profile with active booking types
///
/// # Errors
///
/// Returns `ResourceNotFound` unless `coach_id` is an active coach
pub async fn get_coach(database: &Database, coach_id: Uuid) -> AppResult<CoachProfile> {
    let coach = require_active_coach(database, coach_id).await?;
    let booking_types = database.list_booking_types(coach_id, true).await?;
    Ok(CoachProfile {
        profile: coach.public_profile(),
        booking_types,
    })
}

/// All accounts for the admin console
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn list_users(
    database: &Database,
    role: Option<UserRole>,
    page: &PageParams,
) -> AppResult<Page<User>> {
    let (users, total) = database
        .list_users(role, false, page.limit(), page.offset())
        .await?;
    Ok(Page::new(users, total, page))
}

/// Activate or deactivate an account
///
/// # Errors
///
/// Returns `InvalidInput` when an admin tries to deactivate themselves and
/// `ResourceNotFound` for an unknown user
#[tracing::instrument(skip(database))]
pub async fn set_user_active(
    database: &Database,
    admin_id: Uuid,
    user_id: Uuid,
    is_active: bool,
) -> AppResult<User> {
    if admin_id == user_id && !is_active {
        return Err(AppError::invalid_input("Admins cannot deactivate themselves"));
    }
    let user = database.set_user_active(user_id, is_active).await?;
    info!(%user_id, is_active, "Account status changed");
    Ok(user)
}
