//! Outgoing letters and their approval status machine.
//!
//! ```text
//! draft --submit--> pending --approve--> approved
//!                   pending --reject---> rejected
//! draft|rejected --edit (optionally resubmit)--> draft|rejected|pending
//! ```

use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use warta_core::{DomainError, DomainResult, Entity, IdentityId, OutgoingLetterId};

use crate::text::{self, MAX_SHORT_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutgoingStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl OutgoingStatus {
    pub const ALL: [OutgoingStatus; 4] = [
        OutgoingStatus::Draft,
        OutgoingStatus::Pending,
        OutgoingStatus::Approved,
        OutgoingStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutgoingStatus::Draft => "draft",
            OutgoingStatus::Pending => "pending",
            OutgoingStatus::Approved => "approved",
            OutgoingStatus::Rejected => "rejected",
        }
    }

    /// Whether the creator may still change the content.
    pub fn is_editable(&self) -> bool {
        matches!(self, OutgoingStatus::Draft | OutgoingStatus::Rejected)
    }
}

impl core::fmt::Display for OutgoingStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutgoingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutgoingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation(format!("unknown outgoing status '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingLetter {
    pub id: OutgoingLetterId,
    pub number: String,
    pub letter_date: NaiveDate,
    pub destination: String,
    pub body: String,
    pub attachment: Option<String>,
    pub created_by: IdentityId,
    pub approved_by: Option<IdentityId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub status: OutgoingStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OutgoingLetter {
    pub fn is_created_by(&self, identity: IdentityId) -> bool {
        self.created_by == identity
    }

    /// Only pending letters can be approved or rejected.
    pub fn awaits_decision(&self) -> bool {
        self.status == OutgoingStatus::Pending
    }

    /// Record an approver's decision on a pending letter.
    pub(crate) fn decide(
        &mut self,
        approver: IdentityId,
        outcome: OutgoingStatus,
        note: Option<String>,
        at: DateTime<Utc>,
    ) {
        self.status = outcome;
        self.approved_by = Some(approver);
        self.approved_at = Some(at);
        self.note = note;
        self.updated_at = at;
    }
}

impl Entity for OutgoingLetter {
    type Id = OutgoingLetterId;

    fn id(&self) -> OutgoingLetterId {
        self.id
    }
}

/// Input for creating an outgoing letter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewOutgoingLetter {
    pub number: String,
    pub letter_date: NaiveDate,
    pub destination: String,
    pub body: String,
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// Create directly in `pending` instead of `draft`.
    #[serde(default)]
    pub submit: bool,
}

impl NewOutgoingLetter {
    pub(crate) fn into_letter(
        self,
        creator: IdentityId,
        now: DateTime<Utc>,
    ) -> DomainResult<OutgoingLetter> {
        Ok(OutgoingLetter {
            id: OutgoingLetterId::new(),
            number: text::required("number", &self.number, Some(MAX_SHORT_LEN))?,
            letter_date: self.letter_date,
            destination: text::required("destination", &self.destination, Some(MAX_SHORT_LEN))?,
            body: text::required("body", &self.body, None)?,
            attachment: text::optional(self.attachment),
            created_by: creator,
            approved_by: None,
            approved_at: None,
            status: if self.submit {
                OutgoingStatus::Pending
            } else {
                OutgoingStatus::Draft
            },
            note: text::optional(self.note),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutgoingPatch {
    pub number: Option<String>,
    pub letter_date: Option<NaiveDate>,
    pub destination: Option<String>,
    pub body: Option<String>,
    pub attachment: Option<String>,
    pub note: Option<String>,
    /// Move a draft or rejected letter back to `pending`.
    #[serde(default)]
    pub submit: bool,
}

impl OutgoingPatch {
    /// Apply to `letter`; returns the attachment path that was replaced.
    pub(crate) fn apply(
        self,
        letter: &mut OutgoingLetter,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<String>> {
        if let Some(number) = self.number {
            letter.number = text::required("number", &number, Some(MAX_SHORT_LEN))?;
        }
        if let Some(date) = self.letter_date {
            letter.letter_date = date;
        }
        if let Some(destination) = self.destination {
            letter.destination = text::required("destination", &destination, Some(MAX_SHORT_LEN))?;
        }
        if let Some(body) = self.body {
            letter.body = text::required("body", &body, None)?;
        }
        if self.note.is_some() {
            letter.note = text::optional(self.note);
        }
        let mut replaced = None;
        if let Some(path) = text::optional(self.attachment) {
            replaced = letter.attachment.replace(path);
        }
        if self.submit && letter.status.is_editable() {
            letter.status = OutgoingStatus::Pending;
        }
        letter.updated_at = now;
        Ok(replaced)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutgoingFilter {
    pub status: Option<OutgoingStatus>,
    pub search: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl OutgoingFilter {
    /// In-process evaluation; SQL adapters translate the same rules.
    pub fn matches(&self, letter: &OutgoingLetter) -> bool {
        if self.status.is_some_and(|s| s != letter.status) {
            return false;
        }
        if self.date_from.is_some_and(|from| letter.letter_date < from)
            || self.date_to.is_some_and(|to| letter.letter_date > to)
        {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => {
                let needle = needle.to_lowercase();
                text::contains_ci(&letter.number, &needle)
                    || text::contains_ci(&letter.destination, &needle)
                    || text::contains_ci(&letter.body, &needle)
            }
            None => true,
        }
    }
}
