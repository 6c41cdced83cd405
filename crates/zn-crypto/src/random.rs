//! Random byte source backed by the platform CSPRNG.
//!
//! Natively this is the operating system generator; in the browser it is
//! `crypto.getRandomValues` (via `getrandom`'s `js` feature). There is no
//! fallback generator: if the platform source is unavailable the caller
//! gets [`RandomError`] and must abort.

use rand::rngs::OsRng;
use rand::RngCore;

/// The platform CSPRNG could not produce bytes.
#[derive(Debug, thiserror::Error)]
#[error("secure random source unavailable")]
pub struct RandomError;

/// Fill a fixed-size array with fresh random bytes.
///
/// # Errors
///
/// Returns [`RandomError`] if the platform generator fails.
pub fn random_array<const N: usize>() -> Result<[u8; N], RandomError> {
    let mut out = [0u8; N];
    OsRng.try_fill_bytes(&mut out).map_err(|_| RandomError)?;
    Ok(out)
}
