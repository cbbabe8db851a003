//! Token flow: identity token payload decoding.
//!
//! The token's signature is NOT verified. Whatever the widget hands over is
//! trusted, so an attacker able to inject a credential can sign in as anyone.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use tracing::warn;

use super::AuthError;
use crate::session::{Identity, Provider};

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

/// Decodes the payload segment of a JWT (`header.payload.signature`) into an identity.
pub fn decode_identity(credential: &str) -> Result<Identity, AuthError> {
    let mut segments = credential.trim().split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => return Err(AuthError::TokenDecode("expected three dot-separated segments".into())),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::TokenDecode(e.to_string()))?;
    let claims: Claims =
        serde_json::from_slice(&bytes).map_err(|e| AuthError::TokenDecode(e.to_string()))?;
    if claims.sub.trim().is_empty() {
        return Err(AuthError::TokenDecode("empty `sub` claim".into()));
    }

    warn!(subject = %claims.sub, "identity token accepted without signature verification");

    let display_name = claims
        .name
        .filter(|n| !n.trim().is_empty())
        .or(claims.email)
        .unwrap_or_else(|| claims.sub.clone());

    Ok(Identity {
        display_name,
        avatar_url: claims.picture,
        provider_subject_id: claims.sub,
        provider: Provider::Google,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{body}.c2lnbmF0dXJl")
    }

    #[test]
    fn test_decode_google_claims() {
        let token = token_with(
            r#"{"iss":"https://accounts.google.com","sub":"110169484474386276334","name":"Grace Hopper","picture":"https://lh3.googleusercontent.com/a/photo","email":"grace@example.com"}"#,
        );
        let identity = decode_identity(&token).unwrap();
        assert_eq!(identity.display_name, "Grace Hopper");
        assert_eq!(identity.provider_subject_id, "110169484474386276334");
        assert_eq!(identity.avatar_url.as_deref(), Some("https://lh3.googleusercontent.com/a/photo"));
        assert_eq!(identity.provider, Provider::Google);
    }

    #[test]
    fn test_decode_falls_back_to_email() {
        let identity = decode_identity(&token_with(r#"{"sub":"9","email":"x@example.com"}"#)).unwrap();
        assert_eq!(identity.display_name, "x@example.com");
        assert_eq!(identity.avatar_url, None);
    }

    #[test]
    fn test_decode_accepts_padded_payload() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let body = base64::engine::general_purpose::URL_SAFE.encode(r#"{"sub":"1"}"#);
        let identity = decode_identity(&format!("{header}.{body}.sig")).unwrap();
        assert_eq!(identity.provider_subject_id, "1");
    }

    #[test]
    fn test_decode_failures() {
        for bad in ["", "abc", "a.b", "a..c", "a.b.c.d", "a.!!!.c"] {
            assert!(
                matches!(decode_identity(bad), Err(AuthError::TokenDecode(_))),
                "expected decode failure for {bad:?}"
            );
        }
        assert!(matches!(decode_identity(&token_with("[1,2]")), Err(AuthError::TokenDecode(_))));
        assert!(matches!(decode_identity(&token_with(r#"{"sub":""}"#)), Err(AuthError::TokenDecode(_))));
    }
}
