// Local decoding of access token claims. No signature check is made: the
// result is a hint for the UI, never proof of authorization.
use crate::models::TokenClaims;
use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;

/// Local token decoding failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Decode the payload segment of a JWT-shaped bearer token
///
/// # Errors
///
/// Returns `TokenError::Malformed` if:
/// - The token does not have three dot-separated segments
/// - The payload is not base64
/// - The payload is not a JSON object matching the claim shape
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let payload = decode_payload(token)?;
    if !payload.is_object() {
        return Err(TokenError::Malformed(
            "payload is not a JSON object".to_string(),
        ));
    }
    serde_json::from_value(payload)
        .map_err(|e| TokenError::Malformed(format!("unexpected claim types: {e}")))
}

/// Decode the raw JSON payload of a token
///
/// # Errors
///
/// Returns `TokenError::Malformed` if the token is not three segments of
/// base64-encoded JSON
pub fn decode_payload(token: &str) -> Result<Value, TokenError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Malformed(format!(
            "expected 3 segments, found {}",
            parts.len()
        )));
    }

    let payload_b64 = parts[1].trim_end_matches('=');
    if payload_b64.is_empty() {
        return Err(TokenError::Malformed("empty payload segment".to_string()));
    }

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(payload_b64))
        .map_err(|_| TokenError::Malformed("payload is not base64".to_string()))?;

    serde_json::from_slice(&payload_bytes)
        .map_err(|_| TokenError::Malformed("payload is not JSON".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use serde_json::json;

    fn token_with_payload(payload: &str) -> String {
        let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = general_purpose::URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{body}.c2lnbmF0dXJl")
    }

    #[test]
    fn test_decode_role_and_expiry() {
        let token = token_with_payload(r#"{"role":"STATION_MANAGER","exp":1900000000,"sub":9}"#);
        let claims = decode_claims(&token).unwrap();

        assert_eq!(claims.role(), Some(Role::StationManager));
        assert_eq!(claims.exp, Some(1_900_000_000));
        assert_eq!(claims.sub, Some(json!(9)));
    }

    #[test]
    fn test_decode_accepts_padded_payload() {
        let header = general_purpose::URL_SAFE_NO_PAD.encode("{}");
        let body = general_purpose::URL_SAFE.encode(r#"{"role":"OMC_ADMIN"}"#);
        let token = format!("{header}.{body}.sig");

        assert_eq!(decode_claims(&token).unwrap().role(), Some(Role::OmcAdmin));
    }

    #[test]
    fn test_decode_keeps_unrecognised_role_raw() {
        let token = token_with_payload(r#"{"role":"SUPER_ADMIN"}"#);
        let claims = decode_claims(&token).unwrap();

        assert_eq!(claims.role.as_deref(), Some("SUPER_ADMIN"));
        assert_eq!(claims.role(), None);
    }

    #[test]
    fn test_wrong_segment_count() {
        assert_eq!(
            decode_claims("only.two"),
            Err(TokenError::Malformed("expected 3 segments, found 2".to_string()))
        );
        assert!(decode_claims("").is_err());
        assert!(decode_claims("a.b.c.d").is_err());
    }

    #[test]
    fn test_payload_must_be_base64_json_object() {
        assert!(decode_claims("h.!!!.s").is_err());
        assert!(decode_claims("h..s").is_err());

        let not_json = format!("h.{}.s", general_purpose::URL_SAFE_NO_PAD.encode("role=admin"));
        assert!(decode_claims(&not_json).is_err());

        let array = token_with_payload("[1,2,3]");
        assert_eq!(
            decode_claims(&array),
            Err(TokenError::Malformed("payload is not a JSON object".to_string()))
        );
    }

    #[test]
    fn test_non_string_role_is_malformed() {
        let token = token_with_payload(r#"{"role":7}"#);
        assert!(matches!(decode_claims(&token), Err(TokenError::Malformed(_))));
    }
}
