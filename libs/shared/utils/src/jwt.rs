use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use tracing::debug;

use shared_models::auth::TokenClaims;

/// Reads the claims segment of a bearer token.
///
/// The signature is the backend's business; the client only needs `exp` and `role`.
pub fn decode_claims(token: &str) -> Result<TokenClaims, String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(parts[1].trim_end_matches('=')) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    match serde_json::from_str(&claims_json) {
        Ok(claims) => Ok(claims),
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            Err("Invalid claims format".to_string())
        }
    }
}

/// Opaque (non-JWT) tokens never count as expired; the server decides.
pub fn is_expired(token: &str, now: u64) -> bool {
    match decode_claims(token) {
        Ok(TokenClaims { exp: Some(exp), .. }) => {
            if exp < now {
                debug!("Token expired at {} (now: {})", exp, now);
                true
            } else {
                false
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestTokens, TestUser};

    #[test]
    fn test_claims_round_trip_from_test_token() {
        let user = TestUser::doctor("doc@rs.id");
        let token = TestTokens::valid_for(&user, chrono::Duration::hours(2));

        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role.as_deref(), Some("doctor"));
    }

    #[test]
    fn test_expiry_check() {
        let user = TestUser::doctor("doc@rs.id");
        let now = chrono::Utc::now().timestamp() as u64;

        assert!(is_expired(&TestTokens::expired(&user), now));
        assert!(!is_expired(&TestTokens::valid_for(&user, chrono::Duration::hours(1)), now));
        assert!(!is_expired("opaque-cookie-session", now));
        assert!(decode_claims(&TestTokens::malformed()).is_err());
    }
}
