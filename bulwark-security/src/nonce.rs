//! Per-request CSP nonces
//!
//! A nonce is drawn fresh from the operating system's CSPRNG for every
//! request and encoded as standard base64. The same value goes into the
//! `'nonce-…'` source of the policy and into the `nonce` attribute of the
//! page's inline `<script>` and `<style>` elements.
//!
//! ```
//! use bulwark_security::nonce::generate_nonce;
//!
//! let nonce = generate_nonce(16).unwrap();
//! assert_eq!(nonce.len(), 24);
//! ```

use crate::error::{Result, SecurityError};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt;
use std::sync::Arc;

/// Nonce length in bytes used when none is configured (128 bits)
pub const DEFAULT_NONCE_SIZE: usize = 16;

/// Source of cryptographically secure random bytes
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely or fail; partial output is never used.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// The operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| SecurityError::EntropyUnavailable(e.to_string()))
    }
}

/// Generate `size_bytes` random bytes from the OS and base64-encode them
pub fn generate_nonce(size_bytes: usize) -> Result<String> {
    encode_nonce(&OsEntropy, size_bytes)
}

fn encode_nonce(source: &dyn EntropySource, size_bytes: usize) -> Result<String> {
    if size_bytes == 0 {
        return Err(SecurityError::InvalidNonceSize(size_bytes));
    }

    let mut bytes = vec![0u8; size_bytes];
    source.fill(&mut bytes)?;
    Ok(STANDARD.encode(&bytes))
}

/// Nonce generator with a fixed size and entropy source.
///
/// Cheap to clone; clones share the source.
#[derive(Clone)]
pub struct NonceGenerator {
    size_bytes: usize,
    source: Arc<dyn EntropySource>,
}

impl NonceGenerator {
    /// Generator drawing `size_bytes` from the OS CSPRNG
    pub fn new(size_bytes: usize) -> Result<Self> {
        Self::with_source(size_bytes, OsEntropy)
    }

    pub fn with_source(size_bytes: usize, source: impl EntropySource + 'static) -> Result<Self> {
        if size_bytes == 0 {
            return Err(SecurityError::InvalidNonceSize(size_bytes));
        }
        Ok(Self {
            size_bytes,
            source: Arc::new(source),
        })
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn generate(&self) -> Result<String> {
        encode_nonce(self.source.as_ref(), self.size_bytes)
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self {
            size_bytes: DEFAULT_NONCE_SIZE,
            source: Arc::new(OsEntropy),
        }
    }
}

impl fmt::Debug for NonceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceGenerator")
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Unavailable;

    impl EntropySource for Unavailable {
        fn fill(&self, _dest: &mut [u8]) -> Result<()> {
            Err(SecurityError::EntropyUnavailable("getrandom: ENOSYS".into()))
        }
    }

    #[test]
    fn test_decoded_length_matches_size() {
        for size in [1, 2, 3, 16, 32, 33] {
            let nonce = generate_nonce(size).unwrap();
            assert_eq!(STANDARD.decode(&nonce).unwrap().len(), size);
        }
    }

    #[test]
    fn test_default_size_is_128_bits() {
        let nonce = NonceGenerator::default().generate().unwrap();
        assert_eq!(STANDARD.decode(nonce).unwrap().len(), DEFAULT_NONCE_SIZE);
    }

    #[test]
    fn test_nonces_are_unique() {
        let generator = NonceGenerator::new(16).unwrap();
        let nonces: HashSet<String> = (0..1000).map(|_| generator.generate().unwrap()).collect();
        assert_eq!(nonces.len(), 1000);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(generate_nonce(0), Err(SecurityError::InvalidNonceSize(0))));
        assert!(NonceGenerator::new(0).is_err());
    }

    #[test]
    fn test_entropy_failure_propagates() {
        let generator = NonceGenerator::with_source(16, Unavailable).unwrap();
        assert!(matches!(
            generator.generate(),
            Err(SecurityError::EntropyUnavailable(_))
        ));
    }

    #[test]
    fn test_debug_hides_source() {
        let debug = format!("{:?}", NonceGenerator::default());
        assert!(debug.contains("size_bytes: 16"));
    }
}
