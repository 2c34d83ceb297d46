use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, key: &str, expires: i64) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(key.as_bytes());
    mac.update(b":");
    mac.update(expires.to_string().as_bytes());
    Some(mac)
}

/// Hex HMAC-SHA256 over `key` and its expiry timestamp.
pub fn sign(secret: &str, key: &str, expires: i64) -> String {
    mac_for(secret, key, expires)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

pub fn verify(secret: &str, key: &str, expires: i64, signature: &str, now: i64) -> bool {
    if expires < now {
        return false;
    }
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    mac_for(secret, key, expires)
        .map(|mac| mac.verify_slice(&expected).is_ok())
        .unwrap_or(false)
}
