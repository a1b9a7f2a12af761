// High-entropy share token generation

use rand::{thread_rng, Rng};

/// Base62 alphabet used for share tokens and photo keys
const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of generated share tokens. 43 base62 characters carry ~256
/// bits of entropy, so tokens are unguessable without rate limiting.
pub const SHARE_TOKEN_LENGTH: usize = 43;

/// Generate a random base62 string of the given length
pub fn generate_key(length: usize) -> String {
    let mut rng = thread_rng();
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Generate a share token of the standard length
pub fn generate_share_token() -> String {
    generate_key(SHARE_TOKEN_LENGTH)
}

/// Check that a candidate token uses only the expected alphabet
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| ALPHABET.contains(&b))
}
