//! Incoming letters.
//!
//! ```text
//! pending -> (disposition opened) -> processed -> (all dispositions completed) -> completed
//! ```
//!
//! `completed` is terminal: no further disposition or status change.

use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use warta_core::{DomainError, DomainResult, Entity, IdentityId, IncomingLetterId};

use crate::text::{self, MAX_SHORT_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomingStatus {
    #[serde(alias = "unread")]
    Pending,
    Read,
    Processed,
    #[serde(alias = "archived")]
    Completed,
}

impl IncomingStatus {
    pub const ALL: [IncomingStatus; 4] = [
        IncomingStatus::Pending,
        IncomingStatus::Read,
        IncomingStatus::Processed,
        IncomingStatus::Completed,
    ];

    /// Every status a letter can still leave.
    pub const OPEN: [IncomingStatus; 3] = [
        IncomingStatus::Pending,
        IncomingStatus::Read,
        IncomingStatus::Processed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncomingStatus::Pending => "pending",
            IncomingStatus::Read => "read",
            IncomingStatus::Processed => "processed",
            IncomingStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == IncomingStatus::Completed
    }
}

impl core::fmt::Display for IncomingStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncomingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" | "unread" => Ok(IncomingStatus::Pending),
            "read" => Ok(IncomingStatus::Read),
            "processed" => Ok(IncomingStatus::Processed),
            "completed" | "archived" => Ok(IncomingStatus::Completed),
            other => Err(DomainError::validation(format!(
                "unknown incoming status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "rendah")]
    Low,
    #[default]
    #[serde(alias = "sedang")]
    Medium,
    #[serde(alias = "tinggi")]
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "low" | "rendah" => Ok(Priority::Low),
            "medium" | "sedang" => Ok(Priority::Medium),
            "high" | "tinggi" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(DomainError::validation(format!("unknown priority '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingLetter {
    pub id: IncomingLetterId,
    pub number: String,
    pub letter_date: NaiveDate,
    pub sender: String,
    pub subject: String,
    pub body: Option<String>,
    pub attachment: Option<String>,
    /// Identity that registered the letter on arrival.
    pub received_by: IdentityId,
    pub status: IncomingStatus,
    pub priority: Priority,
    pub read_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IncomingLetter {
    pub fn can_be_dispositioned(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn is_received_by(&self, identity: IdentityId) -> bool {
        self.received_by == identity
    }

    pub(crate) fn set_status(&mut self, status: IncomingStatus, note: Option<String>, at: DateTime<Utc>) {
        if status == IncomingStatus::Read && self.read_at.is_none() {
            self.read_at = Some(at);
        }
        self.status = status;
        if note.is_some() {
            self.note = text::optional(note);
        }
        self.updated_at = at;
    }
}

impl Entity for IncomingLetter {
    type Id = IncomingLetterId;

    fn id(&self) -> IncomingLetterId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewIncomingLetter {
    pub number: String,
    pub letter_date: NaiveDate,
    pub sender: String,
    pub subject: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewIncomingLetter {
    pub(crate) fn into_letter(
        self,
        receiver: IdentityId,
        now: DateTime<Utc>,
    ) -> DomainResult<IncomingLetter> {
        Ok(IncomingLetter {
            id: IncomingLetterId::new(),
            number: text::required("number", &self.number, Some(MAX_SHORT_LEN))?,
            letter_date: self.letter_date,
            sender: text::required("sender", &self.sender, Some(MAX_SHORT_LEN))?,
            subject: text::required("subject", &self.subject, Some(MAX_SHORT_LEN))?,
            body: text::optional(self.body),
            attachment: text::optional(self.attachment),
            received_by: receiver,
            status: IncomingStatus::Pending,
            priority: self.priority,
            read_at: None,
            note: text::optional(self.note),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IncomingPatch {
    pub number: Option<String>,
    pub letter_date: Option<NaiveDate>,
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub attachment: Option<String>,
    pub priority: Option<Priority>,
    pub note: Option<String>,
}

impl IncomingPatch {
    /// Apply to `letter`; returns the attachment path that was replaced.
    pub(crate) fn apply(
        self,
        letter: &mut IncomingLetter,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<String>> {
        if let Some(number) = self.number {
            letter.number = text::required("number", &number, Some(MAX_SHORT_LEN))?;
        }
        if let Some(date) = self.letter_date {
            letter.letter_date = date;
        }
        if let Some(sender) = self.sender {
            letter.sender = text::required("sender", &sender, Some(MAX_SHORT_LEN))?;
        }
        if let Some(subject) = self.subject {
            letter.subject = text::required("subject", &subject, Some(MAX_SHORT_LEN))?;
        }
        if self.body.is_some() {
            letter.body = text::optional(self.body);
        }
        if let Some(priority) = self.priority {
            letter.priority = priority;
        }
        if self.note.is_some() {
            letter.note = text::optional(self.note);
        }
        let mut replaced = None;
        if let Some(path) = text::optional(self.attachment) {
            replaced = letter.attachment.replace(path);
        }
        letter.updated_at = now;
        Ok(replaced)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IncomingFilter {
    pub status: Option<IncomingStatus>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl IncomingFilter {
    pub fn matches(&self, letter: &IncomingLetter) -> bool {
        if self.status.is_some_and(|s| s != letter.status)
            || self.priority.is_some_and(|p| p != letter.priority)
        {
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
                    || text::contains_ci(&letter.sender, &needle)
                    || text::contains_ci(&letter.subject, &needle)
            }
            None => true,
        }
    }
}
