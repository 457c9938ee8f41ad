//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Every catalog record (roots, options, values, variants, webhooks, discounts)
/// is an entity; storage keys its tables by `Entity::id`.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Ord + core::hash::Hash + core::fmt::Debug + Send + Sync;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Whether the entity has been soft-deleted.
    ///
    /// Archived rows are kept for audit but hidden from default reads.
    fn is_archived(&self) -> bool;
}
