use anyhow::Context;
use axum::{
    extract::{FromRef, Multipart, Path, State},
    Json,
};
use time::{Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
    },
    email::{reset_email_body, verification_email_body},
    error::ApiError,
    state::AppState,
    users::{
        dto::{
            ForgotPasswordRequest, LoginRequest, LoginResponse, LoginUser, MessageResponse,
            RegisterForm, RegisterResponse, ResetPasswordRequest, UpdateProfileForm,
            UpdateProfileResponse, UploadedImage, UserResponse, VerifiedUser, VerifyRequest,
            VerifyResponse,
        },
        repo::User,
        services::{
            code_matches, generate_reset_token, generate_verification_code, is_valid_email,
            upload_profile_image,
        },
    },
};

const RESET_TOKEN_TTL: Duration = Duration::hours(1);

/// POST /users/register (multipart: name, email, password, optional image)
#[instrument(skip(state, mp))]
pub async fn register(
    State(state): State<AppState>,
    mp: Multipart,
) -> Result<Json<RegisterResponse>, ApiError> {
    let form = read_register_form(mp).await?;
    let email = form.email.trim().to_lowercase();

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    if form.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::validation("Password too short"));
    }
    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::conflict("User already exists with this email"));
    }

    let code = generate_verification_code();
    let hash = hash_password(&form.password)?;

    let image_url = match form.image {
        Some(img) => Some(upload_profile_image(&state, img).await?),
        None => None,
    };

    let user = User::create(
        &state.db,
        &form.name,
        &email,
        &hash,
        &code,
        image_url.as_deref(),
    )
    .await?;

    // The user row is committed at this point; a failed send only changes
    // the response, never rolls the registration back.
    state
        .mailer
        .send(
            &user.email,
            "Verify Your Email Address",
            &verification_email_body(&user.name, &code),
        )
        .await
        .context("sending verification email")?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(RegisterResponse {
        message: "User registered successfully. Verification email sent.".into(),
        user_id: user.id,
    }))
}

/// POST /user/verify
#[instrument(skip(state, payload))]
pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let user = User::find_by_id(&state.db, payload.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !code_matches(user.verification_code.as_deref(), &payload.code) {
        warn!(user_id = %user.id, "invalid verification code");
        return Err(ApiError::validation("Invalid verification code"));
    }

    User::mark_verified(&state.db, user.id).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, "user verified");
    Ok(Json(VerifyResponse {
        message: "User verified successfully".into(),
        token,
        user: VerifiedUser {
            id: user.id,
            email: user.email,
            name: user.name,
        },
    }))
}

/// POST /user/forgot-password
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found with this email"))?;

    let token = generate_reset_token();
    let expiry = OffsetDateTime::now_utc() + RESET_TOKEN_TTL;
    User::set_reset_token(&state.db, user.id, &token, expiry).await?;

    let reset_url = format!(
        "{}/reset-password/{}",
        payload.base_url.trim_end_matches('/'),
        token
    );

    // Token is committed; the response is still gated on the send.
    state
        .mailer
        .send(&user.email, "Reset Your Password", &reset_email_body(&reset_url))
        .await
        .context("sending password reset email")?;

    info!(user_id = %user.id, "password reset email sent");
    Ok(Json(MessageResponse {
        message: "Password reset email sent successfully.".into(),
    }))
}

/// POST /user/reset-password/:token
#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = User::find_by_valid_reset_token(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::validation("Invalid or expired token"))?;

    let hash = hash_password(&payload.new_password)?;
    User::apply_password_reset(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(MessageResponse {
        message: "Password updated successfully".into(),
    }))
}

/// GET /users
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = User::list_all(&state.db).await?;
    Ok(Json(users))
}

/// POST /user/login
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    let user = authenticate(
        User::find_by_email(&state.db, &email).await?,
        &payload.password,
    )
    .map_err(|e| {
        warn!(email = %email, "login rejected");
        e
    })?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token,
        user: LoginUser {
            user_id: user.id,
            name: user.name,
            email: user.email,
            image_url: user.image_url,
        },
    }))
}

/// Same rejection for unknown email, passwordless account and wrong password
/// so responses do not leak which accounts exist.
fn authenticate(user: Option<User>, password: &str) -> Result<User, ApiError> {
    let invalid = || ApiError::unauthorized("Invalid email or password");
    let user = user.ok_or_else(invalid)?;
    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !verify_password(password, hash)? {
        return Err(invalid());
    }
    Ok(user)
}

/// GET /user/:id
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = User::find_by_id(&state.db, id).await?.ok_or_else(|| {
        ApiError::not_found("User not found. Please ensure you are using the right credentials")
    })?;

    Ok(Json(UserResponse {
        message: "User found successfully".into(),
        data: user,
    }))
}

/// POST /user/updateProfile (multipart: name, email, password?, userId, image?)
#[instrument(skip(state, mp))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    mp: Multipart,
) -> Result<Json<UpdateProfileResponse>, ApiError> {
    let form = read_update_form(mp).await?;

    let user = User::find_by_id(&state.db, form.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if User::find_by_email_excluding(&state.db, &form.email, user.id)
        .await?
        .is_some()
    {
        warn!(user_id = %user.id, "email already in use");
        return Err(ApiError::conflict("Email address already in use"));
    }

    let image_url = match form.image {
        Some(img) => Some(upload_profile_image(&state, img).await?),
        None => None,
    };

    let hash = match form.password.as_deref() {
        Some(p) => Some(hash_password(p)?),
        None => None,
    };

    let updated = User::update_profile(
        &state.db,
        user.id,
        &form.name,
        &form.email,
        hash.as_deref(),
        image_url.as_deref(),
    )
    .await?;

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(UpdateProfileResponse {
        message: "User profile updated successfully".into(),
        user: updated,
    }))
}

// --- multipart parsing ---

struct FormFields {
    text: std::collections::HashMap<String, String>,
    image: Option<UploadedImage>,
}

async fn read_fields(mut mp: Multipart) -> Result<FormFields, ApiError> {
    let mut text = std::collections::HashMap::new();
    let mut image = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(e.to_string()))?;
            if !data.is_empty() {
                image = Some(UploadedImage {
                    bytes: data,
                    content_type,
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::validation(e.to_string()))?;
            text.insert(name, value);
        }
    }
    Ok(FormFields { text, image })
}

async fn read_register_form(mp: Multipart) -> Result<RegisterForm, ApiError> {
    let mut fields = read_fields(mp).await?;
    let name = fields
        .text
        .remove("name")
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::validation("Name is required"))?;
    let email = fields.text.remove("email").unwrap_or_default();
    let password = fields.text.remove("password").unwrap_or_default();
    Ok(RegisterForm {
        name,
        email,
        password,
        image: fields.image,
    })
}

async fn read_update_form(mp: Multipart) -> Result<UpdateProfileForm, ApiError> {
    let mut fields = read_fields(mp).await?;
    let user_id = fields
        .text
        .remove("userId")
        .and_then(|v| v.parse::<Uuid>().ok())
        .ok_or_else(|| {
            error!("updateProfile without a valid userId");
            ApiError::validation("Invalid user id")
        })?;
    let name = fields.text.remove("name").unwrap_or_default();
    let email = fields.text.remove("email").unwrap_or_default();
    // An empty password field means "keep the current one".
    let password = fields.text.remove("password").filter(|p| !p.is_empty());
    Ok(UpdateProfileForm {
        user_id,
        name,
        email,
        password,
        image: fields.image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo::Role;

    fn user_with_password(plain: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: Role::User,
            password_hash: Some(hash_password(plain).unwrap()),
            verified: true,
            verification_code: None,
            reset_password_token: None,
            reset_password_expiry: None,
            image_url: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn rejection_is_identical_for_unknown_email_and_wrong_password() {
        let wrong_password = authenticate(Some(user_with_password("correct horse")), "battery staple")
            .unwrap_err();
        let unknown_email = authenticate(None, "battery staple").unwrap_err();

        assert_eq!(unknown_email.status(), wrong_password.status());
        assert_eq!(unknown_email.to_string(), wrong_password.to_string());
        assert_eq!(unknown_email.to_string(), "Invalid email or password");
    }

    #[test]
    fn correct_password_authenticates() {
        let user = user_with_password("correct horse");
        let id = user.id;
        let authed = authenticate(Some(user), "correct horse").unwrap();
        assert_eq!(authed.id, id);
    }

    #[test]
    fn passwordless_account_cannot_log_in() {
        let mut user = user_with_password("correct horse");
        user.password_hash = None;
        let err = authenticate(Some(user), "correct horse").unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
    }
}
