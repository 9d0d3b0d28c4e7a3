//! Reconstruction configuration
//!
//! This module holds the few knobs that change how captures are decoded. None of them alter
//! what a well-formed capture decodes to; they bound resource use and describe the process the
//! capture was taken from.

/// Default nesting limit for signature decoding
pub const DEFAULT_MAX_SIGNATURE_DEPTH: usize = 50;

/// Configuration shared by every session of a reconstruction run
///
/// # Examples
///
/// ```rust
/// use dynscope::ReconstructionConfig;
///
/// let config = ReconstructionConfig::x86();
/// assert_eq!(config.pointer_size, 4);
/// assert!(config.cache_symbols);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconstructionConfig {
    /// Maximum nesting depth for signature types (default: 50)
    pub max_signature_depth: usize,

    /// Pointer width in bytes of the process the capture was taken from (4 or 8)
    /// Determines the width of raw runtime type addresses embedded in signatures
    pub pointer_size: usize,

    /// Cache resolved symbols per `(slot, kind)` within one session
    pub cache_symbols: bool,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            max_signature_depth: DEFAULT_MAX_SIGNATURE_DEPTH,
            pointer_size: 8,
            cache_symbols: true,
        }
    }
}

impl ReconstructionConfig {
    /// Creates the default configuration for 64-bit processes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for captures taken from a 32-bit process
    #[must_use]
    pub fn x86() -> Self {
        Self {
            pointer_size: 4,
            ..Self::default()
        }
    }

    /// Disables the per-session symbol cache
    #[must_use]
    pub fn without_cache(self) -> Self {
        Self {
            cache_symbols: false,
            ..self
        }
    }
}
