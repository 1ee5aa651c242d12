use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{RequestContext, SessionClaims, SessionHeader};

type HmacSha256 = Hmac<Sha256>;

pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

fn sign(signing_input: &str, secret: &str) -> Result<Vec<u8>, String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Issue an HS256 session token for `context`, valid for `ttl_hours`.
pub fn issue_token(context: &RequestContext, secret: &str, ttl_hours: i64) -> Result<IssuedToken, String> {
    if secret.is_empty() {
        return Err("Session secret is not set".to_string());
    }

    let now = Utc::now();
    let expires_at = Duration::try_hours(ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| format!("Session lifetime of {} hours is out of range", ttl_hours))?
        .timestamp();

    let header = SessionHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let claims = SessionClaims {
        sub: context.user_id.to_string(),
        username: context.username.clone(),
        role: context.role,
        iat: now.timestamp(),
        exp: expires_at,
    };

    let header_json = serde_json::to_string(&header).map_err(|e| e.to_string())?;
    let claims_json = serde_json::to_string(&claims).map_err(|e| e.to_string())?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );
    let signature = URL_SAFE_NO_PAD.encode(sign(&signing_input, secret)?);

    Ok(IssuedToken {
        token: format!("{}.{}", signing_input, signature),
        expires_at,
    })
}

pub fn validate_token(token: &str, secret: &str) -> Result<RequestContext, String> {
    if secret.is_empty() {
        return Err("Session secret is not set".to_string());
    }

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: SessionClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    let now = Utc::now().timestamp();
    if claims.exp < now {
        debug!("Token expired at {} (now: {})", claims.exp, now);
        return Err("Token expired".to_string());
    }

    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| "Invalid subject claim".to_string())?;

    debug!("Token validated successfully for user: {}", user_id);
    Ok(RequestContext {
        user_id,
        username: claims.username,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::Role;

    fn context() -> RequestContext {
        RequestContext {
            user_id: 42,
            username: "alice".to_string(),
            role: Role::Patient,
        }
    }

    #[test]
    fn issued_token_validates_with_same_secret() {
        let issued = issue_token(&context(), "secret", 1).unwrap();
        assert_eq!(issued.token.split('.').count(), 3);
        assert_eq!(validate_token(&issued.token, "secret").unwrap(), context());
    }

    #[test]
    fn out_of_range_lifetime_is_an_error() {
        assert!(issue_token(&context(), "secret", i64::MAX).is_err());
        assert!(issue_token(&context(), "secret", i64::MAX / 3600).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issued = issue_token(&context(), "secret", 1).unwrap();
        assert_eq!(
            validate_token(&issued.token, "other").unwrap_err(),
            "Invalid token signature"
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = issue_token(&context(), "secret", -1).unwrap();
        assert_eq!(validate_token(&issued.token, "secret").unwrap_err(), "Token expired");
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert_eq!(
            validate_token("invalid.token", "secret").unwrap_err(),
            "Invalid token format"
        );
    }

    #[test]
    fn empty_secret_refuses_to_issue() {
        assert!(issue_token(&context(), "", 1).is_err());
    }
}
