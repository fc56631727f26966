use rand::rngs::OsRng;
use rand::RngCore;

/// Bytes of entropy behind every session and reset token.
const TOKEN_BYTES: usize = 32;

/// Collisions are astronomically unlikely at 256 bits, so insert sites give
/// up after this many UNIQUE-constraint bounces and call the store broken.
pub(crate) const MAX_TOKEN_RETRIES: usize = 3;

/// Generates an opaque bearer token: 32 random bytes from the OS CSPRNG,
/// hex-encoded to 64 characters. Tokens carry no structure; the database
/// row they point at is the only meaning they have.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
