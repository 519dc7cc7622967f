//! Recorder configuration.

use stockroom_inventory::DEFAULT_MAX_PHOTO_BYTES;

pub const MAX_CONFLICT_RETRIES_VAR: &str = "STOCKROOM_MAX_CONFLICT_RETRIES";
pub const MAX_PHOTO_BYTES_VAR: &str = "STOCKROOM_MAX_PHOTO_BYTES";

const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderConfig {
    /// How many times an exit is re-read and re-validated after losing a
    /// version race before giving up with `Conflict`.
    pub max_conflict_retries: u32,
    /// Upper bound for inline photo references.
    pub max_photo_bytes: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
            max_photo_bytes: DEFAULT_MAX_PHOTO_BYTES,
        }
    }
}

impl RecorderConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys use defaults; unparsable values
    /// are logged and replaced by defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_conflict_retries: parse_or(
                &lookup,
                MAX_CONFLICT_RETRIES_VAR,
                defaults.max_conflict_retries,
            ),
            max_photo_bytes: parse_or(&lookup, MAX_PHOTO_BYTES_VAR, defaults.max_photo_bytes),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "invalid config value; using default");
            default
        }),
    }
}
