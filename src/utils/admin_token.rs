//! Signed admin session tokens and the shared-secret password check.
//!
//! Token format: `<expires_at_unix>.<base64url(hmac_sha256(secret, expires_at))>`.
//! Nothing is stored server side; logging out only clears the cookie.

use crate::error::{AppError, AppResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str) -> AppResult<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| AppError::Internal(e.into()))
}

pub fn sign_session(secret: &str, expires_at: i64) -> AppResult<String> {
    let mut m = mac(secret)?;
    m.update(expires_at.to_string().as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(m.finalize().into_bytes());
    Ok(format!("{expires_at}.{sig}"))
}

pub fn verify_session(secret: &str, token: &str, now: i64) -> bool {
    let Some((exp_raw, sig_raw)) = token.split_once('.') else {
        return false;
    };
    let Ok(expires_at) = exp_raw.parse::<i64>() else {
        return false;
    };
    if expires_at <= now {
        return false;
    }
    let Ok(sig) = URL_SAFE_NO_PAD.decode(sig_raw) else {
        return false;
    };

    let Ok(mut m) = mac(secret) else {
        return false;
    };
    m.update(exp_raw.as_bytes());
    m.verify_slice(&sig).is_ok()
}

/// Constant-time comparison of a submitted password with the configured one.
/// Both sides are MACed first so the comparison length never leaks.
pub fn password_matches(secret: &str, expected: &str, submitted: &str) -> AppResult<bool> {
    let mut expected_mac = mac(secret)?;
    expected_mac.update(expected.as_bytes());
    let expected_tag = expected_mac.finalize().into_bytes();

    let mut submitted_mac = mac(secret)?;
    submitted_mac.update(submitted.as_bytes());
    Ok(submitted_mac.verify_slice(&expected_tag).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "admin_session_secret_for_unit_tests_only";

    #[test]
    fn signed_session_verifies_until_expiry() {
        let token = sign_session(SECRET, 1_000).unwrap();
        assert!(verify_session(SECRET, &token, 999));
        assert!(!verify_session(SECRET, &token, 1_000));
    }

    #[test]
    fn tampered_expiry_fails() {
        let token = sign_session(SECRET, 1_000).unwrap();
        let (_, sig) = token.split_once('.').unwrap();
        let forged = format!("9999999999.{sig}");
        assert!(!verify_session(SECRET, &forged, 0));
    }

    #[test]
    fn other_secret_fails() {
        let token = sign_session(SECRET, 1_000).unwrap();
        assert!(!verify_session("a_different_secret_of_sufficient_length", &token, 0));
    }

    #[test]
    fn garbage_fails() {
        assert!(!verify_session(SECRET, "", 0));
        assert!(!verify_session(SECRET, "abc", 0));
        assert!(!verify_session(SECRET, "12.%%%", 0));
    }

    #[test]
    fn password_comparison() {
        assert!(password_matches(SECRET, "correct horse", "correct horse").unwrap());
        assert!(!password_matches(SECRET, "correct horse", "correct horse ").unwrap());
        assert!(!password_matches(SECRET, "correct horse", "").unwrap());
    }
}
