//! Random sources used to provision key-encryption keys.

use rand_core::{OsRng, TryRngCore};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use crate::config::{DEFAULT_SECURE_RNG, DEFAULT_SECURE_RNG_PROVIDER};
use crate::error::{Error, Result};

/// A source of cryptographically secure random bytes.
pub trait RandomSource: Send + Sync {
    /// Fills `dest` entirely with random bytes.
    fn fill_bytes(&self, dest: &mut [u8]) -> io::Result<()>;
}

/// The operating system's random number generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) -> io::Result<()> {
        OsRng.try_fill_bytes(dest).map_err(io::Error::other)
    }
}

/// Resolves the `(rng, provider)` selectors carried by the parameter bag to a
/// [`RandomSource`].
///
/// Selector matching ignores ASCII case.
#[derive(Clone)]
pub struct RngRegistry {
    sources: HashMap<(String, String), Arc<dyn RandomSource>>,
}

impl RngRegistry {
    /// A registry with no sources at all.
    pub fn empty() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// A registry holding the built-in `("OsRng", "rand_core")` source.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(
            DEFAULT_SECURE_RNG,
            DEFAULT_SECURE_RNG_PROVIDER,
            Arc::new(OsRandom),
        );
        registry
    }

    /// Registers (or replaces) a source under the given selectors.
    pub fn register(&mut self, rng: &str, provider: &str, source: Arc<dyn RandomSource>) {
        self.sources.insert(selector(rng, provider), source);
    }

    pub fn resolve(&self, rng: &str, provider: &str) -> Result<Arc<dyn RandomSource>> {
        self.sources
            .get(&selector(rng, provider))
            .cloned()
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "no random source '{}' from provider '{}'",
                    rng, provider
                ))
            })
    }
}

impl Default for RngRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn selector(rng: &str, provider: &str) -> (String, String) {
    (
        rng.trim().to_ascii_lowercase(),
        provider.trim().to_ascii_lowercase(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedByte(u8);

    impl RandomSource for FixedByte {
        fn fill_bytes(&self, dest: &mut [u8]) -> io::Result<()> {
            dest.fill(self.0);
            Ok(())
        }
    }

    #[test]
    fn os_random_fills_the_whole_buffer() -> std::result::Result<(), io::Error> {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        OsRandom.fill_bytes(&mut a)?;
        OsRandom.fill_bytes(&mut b)?;
        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn default_source_fills_through_the_registry() -> Result<()> {
        let source =
            RngRegistry::default().resolve(DEFAULT_SECURE_RNG, DEFAULT_SECURE_RNG_PROVIDER)?;
        let mut key = [0u8; 64];
        source
            .fill_bytes(&mut key)
            .map_err(|e| Error::Configuration(e.to_string()))?;
        assert!(key.iter().any(|b| *b != 0));
        Ok(())
    }

    #[test]
    fn default_selector_resolves() -> Result<()> {
        let registry = RngRegistry::default();
        registry.resolve("OsRng", "rand_core")?;
        registry.resolve("osrng", "RAND_CORE")?;
        Ok(())
    }

    #[test]
    fn unknown_selector_is_a_configuration_error() {
        let registry = RngRegistry::with_defaults();
        assert!(matches!(
            registry.resolve("SHA1PRNG", "SUN"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn registered_source_is_returned() -> Result<()> {
        let mut registry = RngRegistry::empty();
        registry.register("fixed", "test", Arc::new(FixedByte(7)));
        let source = registry.resolve("fixed", "test")?;
        let mut buf = [0u8; 4];
        source
            .fill_bytes(&mut buf)
            .map_err(|e| Error::Configuration(e.to_string()))?;
        assert_eq!(buf, [7; 4]);
        Ok(())
    }
}
