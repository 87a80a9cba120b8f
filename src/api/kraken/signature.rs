use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};

use crate::api::error::ApiError;

type HmacSha512 = Hmac<Sha512>;

/// URL-encode a payload, keeping the given key order
pub fn encode_payload(payload: &[(String, String)]) -> String {
    payload
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Compute the `API-Sign` header value for a private request.
///
/// `HMAC-SHA512(base64_decode(secret), path ++ SHA256(nonce ++ urlencode(payload)))`,
/// base64-encoded. The payload must carry the `nonce` it will be sent with.
pub fn sign_request(path: &str, payload: &[(String, String)], secret: &str) -> Result<String, ApiError> {
    let nonce = payload
        .iter()
        .find(|(k, _)| k == "nonce")
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| ApiError::SignatureError("payload has no nonce".to_string()))?;

    let key = general_purpose::STANDARD.decode(secret)?;

    let encoded = encode_payload(payload);
    let digest = Sha256::new()
        .chain_update(nonce.as_bytes())
        .chain_update(encoded.as_bytes())
        .finalize();

    let mut mac = HmacSha512::new_from_slice(&key)
        .map_err(|e| ApiError::SignatureError(e.to_string()))?;
    mac.update(path.as_bytes());
    mac.update(&digest);

    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
