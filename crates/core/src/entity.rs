//! Entity trait: identity + continuity across state changes.

/// Anything persisted as one row and addressed by a typed identifier.
///
/// In-memory adapters key their tables by [`Entity::Id`], so every
/// identity, token, letter and disposition implements this.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + Send + Sync;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
