//! `warta-letters` — outgoing letter approval and incoming letter disposition.
//!
//! Entities and status machines live in [`outgoing`], [`incoming`] and
//! [`disposition`]. [`LetterLifecycle`] drives every transition through the
//! compare-and-set ports in [`repository`].

pub mod attachment;
pub mod disposition;
pub mod incoming;
pub mod lifecycle;
pub mod outgoing;
pub mod policy;
pub mod repository;

mod text;

pub use attachment::AttachmentStore;
pub use disposition::{Disposition, DispositionStatus, DispositionStep, NewDisposition};
pub use incoming::{
    IncomingFilter, IncomingLetter, IncomingPatch, IncomingStatus, NewIncomingLetter, Priority,
};
pub use lifecycle::{IncomingDetail, LetterLifecycle, LetterStores};
pub use outgoing::{NewOutgoingLetter, OutgoingFilter, OutgoingLetter, OutgoingPatch, OutgoingStatus};
pub use policy::LetterPolicy;
pub use repository::{
    DispositionRepository, IncomingLetterRepository, OpenOutcome, OutgoingLetterRepository,
};
