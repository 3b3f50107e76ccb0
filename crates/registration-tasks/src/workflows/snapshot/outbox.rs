use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use super::SnapshotConnection;
use crate::workflows::cancellation::{
    render_summary_html, CaseResolution, CaseStore, ContactNotification, GatewayError,
    IssueRecord, NotificationComposer, RegistrationStatusChange, RegistrationStore,
    SuccessRecord, SummaryDispatcher, SUMMARY_SUBJECT,
};

pub const REGISTRATION_UPDATES_FILE: &str = "registration_updates.jsonl";
pub const CASE_RESOLUTIONS_FILE: &str = "case_resolutions.jsonl";
pub const NOTIFICATIONS_FILE: &str = "notifications.jsonl";
pub const SUMMARIES_FILE: &str = "summaries.jsonl";

static EMAIL_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_email_id(now: NaiveDateTime) -> String {
    let id = EMAIL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("email-{}-{id:06}", now.format("%Y%m%d%H%M%S"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxEmailKind {
    ContactNotification,
    Summary,
}

/// Email as written to the outbox journals.
#[derive(Debug, Clone, Serialize)]
pub struct OutboxEmail {
    pub id: String,
    pub kind: OutboxEmailKind,
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regarding_contact: Option<String>,
    pub subject: String,
    pub body: String,
    pub created_on: NaiveDateTime,
}

/// Write side of the snapshot: every mutation and email is appended to a journal file.
pub struct Outbox<'a> {
    connection: &'a SnapshotConnection,
}

impl<'a> Outbox<'a> {
    pub fn new(connection: &'a SnapshotConnection) -> Self {
        Self { connection }
    }

    fn append<T: Serialize>(&self, file: &str, entry: &T) -> Result<(), GatewayError> {
        let path = self.connection.outbox_dir().join(file);
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut handle = OpenOptions::new().create(true).append(true).open(path)?;
        handle.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl RegistrationStore for Outbox<'_> {
    fn apply_status(&self, change: &RegistrationStatusChange) -> Result<(), GatewayError> {
        info!(registration_id = %change.registration_id, "updating registration");
        self.append(REGISTRATION_UPDATES_FILE, change)?;
        info!(
            registration_id = %change.registration_id,
            status = %change.status,
            sub_status = %change.sub_status,
            modified_by = %change.modified_by,
            modified_on = %change.modified_on,
            "updated registration"
        );
        Ok(())
    }
}

impl CaseStore for Outbox<'_> {
    fn resolve(&self, resolution: &CaseResolution) -> Result<(), GatewayError> {
        self.append(CASE_RESOLUTIONS_FILE, resolution)?;
        info!(
            case_id = %resolution.case_id,
            ticket_number = %resolution.ticket_number,
            "resolved case"
        );
        Ok(())
    }
}

impl NotificationComposer for Outbox<'_> {
    fn create(&self, notification: &ContactNotification) -> Result<String, GatewayError> {
        let to = notification.to_address.clone().ok_or_else(|| {
            GatewayError::Rejected(format!(
                "contact {} has no email address",
                notification.to_contact
            ))
        })?;

        let email = OutboxEmail {
            id: next_email_id(notification.created_on),
            kind: OutboxEmailKind::ContactNotification,
            from: notification.from.clone(),
            to,
            regarding_contact: Some(notification.to_contact.to_string()),
            subject: notification.subject.clone(),
            body: notification.body.clone(),
            created_on: notification.created_on,
        };
        self.append(NOTIFICATIONS_FILE, &email)?;
        info!(
            email_id = %email.id,
            template = %notification.template_title,
            subject = %email.subject,
            "created email message from template"
        );
        Ok(email.id)
    }
}

impl SummaryDispatcher for Outbox<'_> {
    fn send(
        &self,
        recipient: &str,
        successes: &[SuccessRecord],
        issues: &[IssueRecord],
        sent_on: NaiveDateTime,
    ) -> Result<(), GatewayError> {
        if recipient.trim().is_empty() {
            return Err(GatewayError::Rejected("recipient address is blank".to_string()));
        }

        info!(%recipient, "creating summary email for scheduled task owner");
        let email = OutboxEmail {
            id: next_email_id(sent_on),
            kind: OutboxEmailKind::Summary,
            from: self.connection.actor_id().to_string(),
            to: recipient.to_string(),
            regarding_contact: None,
            subject: SUMMARY_SUBJECT.to_string(),
            body: render_summary_html(successes, issues),
            created_on: sent_on,
        };
        self.append(SUMMARIES_FILE, &email)
    }
}
