use hmac::{ Hmac, Mac };
use sha2::Sha256;

use crate::error::{ AppError, Result };

pub const SIGNATURE_HEADER: &str = "x-vfd-signature";

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e|
        AppError::Config(format!("Invalid webhook secret: {}", e))
    )?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex signature over the raw request body.
pub fn verify(secret: &str, body: &[u8], signature: Option<&str>) -> Result<()> {
    let signature = signature.map(str::trim).filter(|s| !s.is_empty()).ok_or(AppError::InvalidSignature)?;
    let expected = hex::decode(signature).map_err(|_| AppError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e|
        AppError::Config(format!("Invalid webhook secret: {}", e))
    )?;
    mac.update(body);
    mac.verify_slice(&expected).map_err(|_| AppError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"reference":"abc","amount":"100.00"}"#;

    #[test]
    fn test_valid_signature_accepted() {
        let signature = sign("whsec", BODY).unwrap();
        assert!(verify("whsec", BODY, Some(&signature)).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let signature = sign("whsec", BODY).unwrap();
        let tampered = br#"{"reference":"abc","amount":"900.00"}"#;

        assert!(matches!(verify("whsec", tampered, Some(&signature)), Err(AppError::InvalidSignature)));
    }

    #[test]
    fn test_missing_or_malformed_signature_rejected() {
        assert!(matches!(verify("whsec", BODY, None), Err(AppError::InvalidSignature)));
        assert!(matches!(verify("whsec", BODY, Some("not-hex")), Err(AppError::InvalidSignature)));
        assert!(matches!(verify("other", BODY, Some(&sign("whsec", BODY).unwrap())), Err(AppError::InvalidSignature)));
    }
}
