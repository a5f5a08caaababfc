//! `warta-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the error taxonomy shared by every service, the store error
//! that persistence ports return, a clock seam and pagination.

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod page;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, StoreError, StoreResult};
pub use id::{DispositionId, IdentityId, IncomingLetterId, OutgoingLetterId, RoleId, TokenId};
pub use page::{Page, PageRequest};
