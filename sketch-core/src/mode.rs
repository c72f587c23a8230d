//! Online/offline service mode.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::SketchError;

/// Whether guesses may call the remote vision model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    /// Remote calls are attempted, falling back on failure.
    #[default]
    Online,
    /// Remote calls are skipped; every guess is synthesized locally.
    Offline,
}

impl ServiceMode {
    /// Lowercase name, as used in configuration and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }

    const fn to_bits(self) -> u8 {
        match self {
            Self::Online => 0,
            Self::Offline => 1,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        if bits == 0 {
            Self::Online
        } else {
            Self::Offline
        }
    }
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceMode {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            other => Err(SketchError::UnknownMode(other.to_string())),
        }
    }
}

/// Process-wide service mode, shared by every request.
///
/// Reads and writes are single atomic operations. A request that reads
/// `Online` may still be running after the mode flips to `Offline`; that
/// staleness is accepted.
#[derive(Debug, Clone, Default)]
pub struct SharedServiceMode {
    bits: Arc<AtomicU8>,
}

impl SharedServiceMode {
    /// Create a shared mode starting at `initial`.
    #[must_use]
    pub fn new(initial: ServiceMode) -> Self {
        Self {
            bits: Arc::new(AtomicU8::new(initial.to_bits())),
        }
    }

    /// Current mode.
    #[must_use]
    pub fn get(&self) -> ServiceMode {
        ServiceMode::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Switch mode, returning the previous one.
    pub fn set(&self, mode: ServiceMode) -> ServiceMode {
        let previous = ServiceMode::from_bits(self.bits.swap(mode.to_bits(), Ordering::AcqRel));
        if previous != mode {
            tracing::info!(from = %previous, to = %mode, "Service mode changed");
        }
        previous
    }
}
