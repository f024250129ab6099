use base64::Engine;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};

pub const DEFAULT_TOKEN_BYTES: usize = 32;
pub const OTP_LEN: usize = 6;

/// Generate a secure random session token using the OS RNG.
pub fn generate_token_default() -> String {
    let mut rng = OsRng;
    generate_token(&mut rng, DEFAULT_TOKEN_BYTES)
}

/// Generate a URL-safe token from random bytes.
/// - Uses Base64 URL-safe, no padding.
/// - Typically 32 bytes -> ~43 char token.
pub fn generate_token<R: RngCore>(rng: &mut R, nbytes: usize) -> String {
    let mut buf = vec![0u8; nbytes];
    rng.fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&buf)
}

/// Six-digit numeric OTP for email verification.
pub fn generate_otp_default() -> String {
    let mut rng = OsRng;
    generate_otp(&mut rng, OTP_LEN)
}

pub fn generate_otp<R: Rng>(rng: &mut R, len: usize) -> String {
    const DIGITS: &[u8] = b"0123456789";
    (0..len)
        .map(|_| DIGITS[rng.gen_range(0..DIGITS.len())] as char)
        .collect()
}

/// Hash a token or OTP using SHA-256.
/// Store this output in DB (BLOB), never the raw value.
pub fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let out = hasher.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}
