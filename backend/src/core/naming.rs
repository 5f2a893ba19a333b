//! Pseudo-random transaction names
//!
//! Unnamed transactions get a stable 32-hex-digit name derived from one
//! draw of their own draw source.

use sha2::{Digest, Sha256};

/// Number of hex digits kept from the digest
const NAME_LEN: usize = 32;

/// Derive a name from a seed draw.
///
/// SHA-256 over the decimal text of `seed_draw`, truncated to 32 hex digits.
///
/// # Example
/// ```
/// use cashflow_simulator_core_rs::core::naming::derive_name;
///
/// let name = derive_name(0);
/// assert_eq!(name.len(), 32);
/// assert_eq!(name, derive_name(0));
/// ```
pub fn derive_name(seed_draw: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed_draw.to_string().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..NAME_LEN].to_string()
}
