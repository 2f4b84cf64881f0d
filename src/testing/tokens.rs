//! HS256 tokens for tests. The session layer never verifies signatures, but
//! tokens are signed anyway so they look like what the backend issues.

use super::constants::{TEST_EMAIL, TEST_JWT_KEY, TEST_USER_ID};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

/// Sign `claims` into a compact token
///
/// # Panics
///
/// Never in practice: HMAC accepts keys of any length.
#[must_use]
pub fn mint_token(claims: &Value) -> String {
    let header = json!({ "alg": "HS256", "typ": "JWT" });
    let header_b64 = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
    let message = format!("{header_b64}.{payload_b64}");

    let mut mac =
        Hmac::<Sha256>::new_from_slice(TEST_JWT_KEY).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    let signature = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{message}.{signature}")
}

/// Token for the default test user carrying `role` as its role claim
#[must_use]
pub fn token_for_role(role: &str) -> String {
    let now = Utc::now();
    mint_token(&json!({
        "sub": TEST_USER_ID,
        "email": TEST_EMAIL,
        "role": role,
        "iat": now.timestamp(),
        "exp": (now + Duration::hours(1)).timestamp(),
    }))
}
