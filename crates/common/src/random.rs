//! CSPRNG-backed random strings
//!
//! All values come from the operating system's random source. A failing
//! source is reported, never papered over with a weaker generator.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

// Largest multiple of 62 that fits in a byte; bytes at or above it are
// rejected so every symbol is equally likely.
const ACCEPT_BELOW: u8 = 248;

/// Errors raised while drawing from the OS random source
#[derive(Debug, Error)]
pub enum RandomError {
    #[error("secure random source unavailable: {0}")]
    Unavailable(#[from] rand::Error),
}

/// Generate `len` characters drawn uniformly from `[A-Za-z0-9]`.
///
/// # Errors
/// Returns `RandomError::Unavailable` if the OS random source fails.
pub fn alphanumeric(len: usize) -> Result<String, RandomError> {
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];

    while out.len() < len {
        OsRng.try_fill_bytes(&mut buf)?;
        for &byte in buf.iter().filter(|&&b| b < ACCEPT_BELOW) {
            out.push(char::from(ALPHANUMERIC[usize::from(byte) % ALPHANUMERIC.len()]));
            if out.len() == len {
                break;
            }
        }
    }

    Ok(out)
}

/// Generate `bytes` random bytes rendered as lowercase hex.
///
/// # Errors
/// Returns `RandomError::Unavailable` if the OS random source fails.
pub fn random_hex(bytes: usize) -> Result<String, RandomError> {
    let mut buf = vec![0u8; bytes];
    OsRng.try_fill_bytes(&mut buf)?;
    Ok(hex::encode(buf))
}
