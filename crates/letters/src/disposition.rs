//! Dispositions: routing an incoming letter to a handling identity.
//!
//! ```text
//! pending -> received -> processing -> completed
//! ```
//!
//! Only the recipient moves a disposition forward. Each step is applied as a
//! compare-and-set against the statuses it is allowed from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warta_core::{DispositionId, DomainError, Entity, IdentityId, IncomingLetterId};

use crate::text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispositionStatus {
    Pending,
    #[serde(alias = "diterima")]
    Received,
    #[serde(alias = "diproses")]
    Processing,
    #[serde(alias = "selesai")]
    Completed,
}

impl DispositionStatus {
    pub const ALL: [DispositionStatus; 4] = [
        DispositionStatus::Pending,
        DispositionStatus::Received,
        DispositionStatus::Processing,
        DispositionStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DispositionStatus::Pending => "pending",
            DispositionStatus::Received => "received",
            DispositionStatus::Processing => "processing",
            DispositionStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        *self == DispositionStatus::Completed
    }
}

impl core::fmt::Display for DispositionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for DispositionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(DispositionStatus::Pending),
            "received" | "diterima" => Ok(DispositionStatus::Received),
            "processing" | "diproses" => Ok(DispositionStatus::Processing),
            "completed" | "selesai" => Ok(DispositionStatus::Completed),
            other => Err(DomainError::validation(format!(
                "unknown disposition status '{other}'"
            ))),
        }
    }
}

/// Recipient-driven transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionStep {
    /// Acknowledge receipt. Repeating it while still `received` re-stamps.
    Read,
    StartProcessing,
    Complete,
}

impl DispositionStep {
    pub fn allowed_from(&self) -> &'static [DispositionStatus] {
        match self {
            DispositionStep::Read | DispositionStep::StartProcessing => {
                &[DispositionStatus::Pending, DispositionStatus::Received]
            }
            DispositionStep::Complete => &[
                DispositionStatus::Pending,
                DispositionStatus::Received,
                DispositionStatus::Processing,
            ],
        }
    }

    pub fn target(&self) -> DispositionStatus {
        match self {
            DispositionStep::Read => DispositionStatus::Received,
            DispositionStep::StartProcessing => DispositionStatus::Processing,
            DispositionStep::Complete => DispositionStatus::Completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DispositionStep::Read => "read",
            DispositionStep::StartProcessing => "start processing",
            DispositionStep::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposition {
    pub id: DispositionId,
    pub letter_id: IncomingLetterId,
    pub from_identity: IdentityId,
    pub to_identity: IdentityId,
    pub instruction: Option<String>,
    /// Outcome written by the recipient.
    pub note: Option<String>,
    pub status: DispositionStatus,
    pub read_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Disposition {
    pub fn is_recipient(&self, identity: IdentityId) -> bool {
        self.to_identity == identity
    }

    pub fn is_sender(&self, identity: IdentityId) -> bool {
        self.from_identity == identity
    }

    /// Apply `step` in memory. The caller persists it with a status CAS.
    pub(crate) fn advance(&mut self, step: DispositionStep, note: Option<String>, at: DateTime<Utc>) {
        match step {
            DispositionStep::Read => self.read_at = Some(at),
            DispositionStep::StartProcessing => {
                self.read_at.get_or_insert(at);
            }
            DispositionStep::Complete => {
                self.completed_at = Some(at);
                if let Some(note) = text::optional(note) {
                    self.note = Some(note);
                }
            }
        }
        self.status = step.target();
        self.updated_at = at;
    }
}

impl Entity for Disposition {
    type Id = DispositionId;

    fn id(&self) -> DispositionId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewDisposition {
    pub letter_id: IncomingLetterId,
    pub to_identity: IdentityId,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewDisposition {
    pub(crate) fn into_disposition(self, from: IdentityId, now: DateTime<Utc>) -> Disposition {
        Disposition {
            id: DispositionId::new(),
            letter_id: self.letter_id,
            from_identity: from,
            to_identity: self.to_identity,
            instruction: text::optional(self.instruction),
            note: text::optional(self.note),
            status: DispositionStatus::Pending,
            read_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
