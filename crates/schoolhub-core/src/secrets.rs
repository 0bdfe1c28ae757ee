//! Random codes and bcrypt hashing for invitation secrets.

use bcrypt::{DEFAULT_COST, hash, verify};
use rand::Rng;

use crate::AppError;

/// Uppercase letters and digits without the easily confused `0`, `O`, `1`, `I`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generates a random code of `len` characters drawn from [`CODE_ALPHABET`].
pub fn random_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

pub fn hash_secret(secret: &str) -> Result<String, AppError> {
    hash_secret_with_cost(secret, DEFAULT_COST)
}

pub fn hash_secret_with_cost(secret: &str, cost: u32) -> Result<String, AppError> {
    hash(secret, cost)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to hash secret: {}", e)))
}

pub fn verify_secret(secret: &str, hashed: &str) -> Result<bool, AppError> {
    verify(secret, hashed)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to verify secret: {}", e)))
}
