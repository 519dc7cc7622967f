//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. To
/// "modify" one, build a new one. A movement's `Quantity` is the canonical
/// example: two quantities of 5 are the same quantity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
