use anyhow::Context;
use lazy_static::lazy_static;
use rand::RngCore;
use regex::Regex;
use uuid::Uuid;

use crate::state::AppState;
use crate::storage::ext_from_mime;
use crate::users::dto::UploadedImage;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn random_hex(n_bytes: usize) -> String {
    let mut buf = vec![0u8; n_bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{:02x}", b)).collect()
}

/// 6 hex characters, emailed to prove control of the address.
pub fn generate_verification_code() -> String {
    random_hex(3)
}

/// Opaque 40-character reset token.
pub fn generate_reset_token() -> String {
    random_hex(20)
}

/// Exact match only; a cleared stored code (already used) matches nothing.
pub fn code_matches(stored: Option<&str>, submitted: &str) -> bool {
    matches!(stored, Some(code) if code == submitted)
}

pub async fn upload_profile_image(st: &AppState, img: UploadedImage) -> anyhow::Result<String> {
    let ext = ext_from_mime(&img.content_type).unwrap_or("bin");
    let key = format!("profiles/{}.{}", Uuid::new_v4(), ext);
    st.storage
        .upload(&key, img.bytes, &img.content_type)
        .await
        .with_context(|| format!("upload profile image {}", key))
}
