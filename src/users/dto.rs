use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo::User;

/// Image file lifted out of a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub image: Option<UploadedImage>,
}

#[derive(Debug)]
pub struct UpdateProfileForm {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub image: Option<UploadedImage>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub user_id: Uuid,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifiedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub message: String,
    pub token: String,
    pub user: VerifiedUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub data: User,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub message: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_uses_frontend_field_names() {
        let resp = LoginResponse {
            message: "Login successful".into(),
            token: "jwt".into(),
            user: LoginUser {
                user_id: Uuid::new_v4(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
                image_url: None,
            },
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json["user"].get("userId").is_some());
        assert!(json["user"].get("imageURL").is_none());
    }

    #[test]
    fn verify_request_accepts_camel_case() {
        let raw = format!(r#"{{"userId":"{}","code":"a1b2c3"}}"#, Uuid::new_v4());
        let req: VerifyRequest = serde_json::from_str(&raw).unwrap();
        assert_eq!(req.code, "a1b2c3");
    }
}
