use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::app_error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, timestamp: &str, body: &[u8]) -> AppResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("HMAC key rejected".into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
}

/// Build a `t=<timestamp>,v1=<hex-hmac>` signature header for `body`.
pub fn sign_webhook_payload(secret: &str, timestamp: i64, body: &[u8]) -> AppResult<String> {
    let mac = mac_for(secret, &timestamp.to_string(), body)?;
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={},v1={}", timestamp, signature))
}

/// Verify a gateway signature header against the raw request body.
///
/// Accepts the header if any `v1` entry matches and the timestamp is within
/// `tolerance_secs` of `now`. Runs before the body is parsed.
pub fn verify_webhook_signature(
    body: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> AppResult<()> {
    // Parse signature header: "t=timestamp,v1=signature,..."
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = Some(value),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| AppError::InvalidSignature("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(AppError::InvalidSignature("missing v1 signature".into()));
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| AppError::InvalidSignature("invalid timestamp".into()))?;

    let mac = mac_for(secret, timestamp, body)?;
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if !matched {
        return Err(AppError::InvalidSignature("signature mismatch".into()));
    }

    if (now - ts).abs() > tolerance_secs {
        return Err(AppError::InvalidSignature("timestamp outside tolerance".into()));
    }

    Ok(())
}
