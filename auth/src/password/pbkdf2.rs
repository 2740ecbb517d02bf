use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;

use super::errors::PasswordError;

/// Salt length in bytes.
pub const SALT_SIZE: usize = 16;

/// Derived hash length in bytes.
pub const HASH_SIZE: usize = 20;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Password hashing implementation.
///
/// Derives a 20-byte PBKDF2-HMAC-SHA512 digest from the password and a
/// fresh 16-byte random salt. The stored form is `base64(salt || hash)`,
/// so every hash carries its own salt.
///
/// The iteration count is not part of the stored form: hashes are only
/// verifiable by a hasher configured with the same count.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    /// Create a new password hasher with the default iteration count.
    ///
    /// # Returns
    /// PasswordHasher configured with 100 000 iterations
    pub fn new() -> Self {
        Self::with_iterations(DEFAULT_ITERATIONS)
    }

    /// Create a password hasher with a custom iteration count.
    ///
    /// A count of zero is raised to one.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash a plaintext password for storage.
    ///
    /// Consumes 16 bytes of OS randomness. A failing entropy source panics;
    /// there is nothing a caller could do to recover from it.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// Base64 encoding of the salt followed by the derived hash
    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);

        let hash = self.derive(password, &salt);

        let mut stored = [0u8; SALT_SIZE + HASH_SIZE];
        stored[..SALT_SIZE].copy_from_slice(&salt);
        stored[SALT_SIZE..].copy_from_slice(&hash);

        STANDARD.encode(stored)
    }

    /// Verify a password against a stored hash.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Value previously returned by [`PasswordHasher::hash`]
    ///
    /// # Returns
    /// True if password matches, false otherwise
    ///
    /// # Errors
    /// * `Decoding` - Stored hash is not valid base64
    /// * `InvalidLength` - Stored hash does not decode to salt plus hash bytes
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let (salt, expected) = decode_stored_hash(stored_hash)?;
        let actual = self.derive(password, &salt);

        Ok(constant_time_eq(&expected, &actual))
    }

    fn derive(&self, password: &str, salt: &[u8; SALT_SIZE]) -> [u8; HASH_SIZE] {
        let mut hash = [0u8; HASH_SIZE];
        pbkdf2_hmac::<Sha512>(password.as_bytes(), salt, self.iterations, &mut hash);
        hash
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_stored_hash(
    stored_hash: &str,
) -> Result<([u8; SALT_SIZE], [u8; HASH_SIZE]), PasswordError> {
    let bytes = STANDARD
        .decode(stored_hash.trim())
        .map_err(|e| PasswordError::Decoding(e.to_string()))?;

    if bytes.len() != SALT_SIZE + HASH_SIZE {
        return Err(PasswordError::InvalidLength {
            expected: SALT_SIZE + HASH_SIZE,
            actual: bytes.len(),
        });
    }

    let mut salt = [0u8; SALT_SIZE];
    let mut hash = [0u8; HASH_SIZE];
    salt.copy_from_slice(&bytes[..SALT_SIZE]);
    hash.copy_from_slice(&bytes[SALT_SIZE..]);

    Ok((salt, hash))
}

/// Compare two fixed-length digests without an early exit.
fn constant_time_eq(a: &[u8; HASH_SIZE], b: &[u8; HASH_SIZE]) -> bool {
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
