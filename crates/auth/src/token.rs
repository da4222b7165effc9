//! Opaque token generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

/// Generates a 256-bit random token encoded as base64url (43 characters).
///
/// Used for both bearer tokens and password-reset tokens; the value is
/// opaque and carries no claims.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
