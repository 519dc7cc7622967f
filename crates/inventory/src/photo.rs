//! Opaque image references stored on items, trucks and movements.
//!
//! The blob store hands back either a URL or inline-encoded image data. The
//! domain never looks inside; it only bounds the size so inline payloads do
//! not blow past the document store's record limit.

use stockroom_core::{DomainError, DomainResult};

/// Largest accepted reference, in bytes (inline base64 images included).
pub const DEFAULT_MAX_PHOTO_BYTES: usize = 1_000_000;

/// Normalise an optional photo reference: blank becomes `None`, oversized is
/// rejected.
pub fn normalize_photo_ref(photo_ref: Option<String>, max_bytes: usize) -> DomainResult<Option<String>> {
    match photo_ref {
        None => Ok(None),
        Some(p) if p.trim().is_empty() => Ok(None),
        Some(p) if p.len() > max_bytes => Err(DomainError::validation(
            "photo_ref",
            format!("image too large ({} bytes, limit {max_bytes})", p.len()),
        )),
        Some(p) => Ok(Some(p)),
    }
}
