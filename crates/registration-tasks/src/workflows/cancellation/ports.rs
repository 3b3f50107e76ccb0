use chrono::NaiveDateTime;
use serde::Serialize;

use super::domain::{
    CaseResolution, Contact, ContactId, NotificationTemplate, Registration,
    RegistrationStatusChange, SupportCase,
};
use super::ledger::{IssueRecord, SuccessRecord};

/// Snapshot of every record a run works from, taken once before processing starts.
/// `None` means the source could not supply that input.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub contacts: Option<Vec<Contact>>,
    pub cases: Option<Vec<SupportCase>>,
    pub registrations: Option<Vec<Registration>>,
    pub template: Option<NotificationTemplate>,
    pub recipients: Option<Vec<String>>,
}

/// Read side of the record store.
pub trait CandidateSource {
    /// Raw configured run-date value, if one is set.
    fn run_date(&self) -> Result<Option<String>, GatewayError>;
    fn candidates(&self) -> CandidateSet;
}

/// Applies status transitions to registrations.
pub trait RegistrationStore {
    fn apply_status(&self, change: &RegistrationStatusChange) -> Result<(), GatewayError>;
}

/// Closes support cases.
pub trait CaseStore {
    fn resolve(&self, resolution: &CaseResolution) -> Result<(), GatewayError>;
}

/// Rendered notification ready to be persisted as an email addressed to a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactNotification {
    pub from: String,
    pub to_contact: ContactId,
    pub to_address: Option<String>,
    pub template_title: String,
    pub subject: String,
    pub body: String,
    pub created_on: NaiveDateTime,
}

/// Creates the per-contact notification email.
pub trait NotificationComposer {
    fn create(&self, notification: &ContactNotification) -> Result<String, GatewayError>;
}

/// Sends the end-of-run summary to one task owner. `sent_on` is the run's clock, shared with
/// every mutation of the same run.
pub trait SummaryDispatcher {
    fn send(
        &self,
        recipient: &str,
        successes: &[SuccessRecord],
        issues: &[IssueRecord],
        sent_on: NaiveDateTime,
    ) -> Result<(), GatewayError>;
}

/// Failure reported by an external collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Encoding(#[from] serde_json::Error),
}
