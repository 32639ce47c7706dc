// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HMAC-SHA256 webhook signatures in the `sha256=<hex>` header format.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Prefix the provider puts in front of the hex digest.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Signs `body` with `secret`, returning the full header value.
pub fn sign(body: &[u8], secret: &[u8]) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Checks a signature header against the raw body.
///
/// The `sha256=` prefix is optional. An empty header, a non-hex digest, or a
/// digest of the wrong length all verify as `false`. The digest comparison is
/// constant-time.
pub fn verify(raw_body: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let header = signature_header.trim();
    let digest_hex = header.strip_prefix(SIGNATURE_PREFIX).unwrap_or(header);
    if digest_hex.is_empty() {
        return false;
    }
    let Ok(expected) = hex::decode(digest_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&expected).is_ok()
}
