//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Records kept by the catalog adapters (items, trucks, employees) and the
/// ledger's movements are entities: two records with the same id are the same
/// record, whatever their other fields say.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Soft-delete flag. Inactive records stay stored but are hidden from
    /// "active" listings and from stock aggregation.
    fn is_active(&self) -> bool;
}
