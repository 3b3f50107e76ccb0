//! Record snapshot on disk standing in for the CRM: CSV/JSON inputs under the data directory,
//! JSON-lines journals for every mutation and email under the outbox directory.

mod outbox;
mod parser;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::StoreConfig;
use crate::workflows::cancellation::{
    Account, AccountId, CandidateSet, CandidateSource, CaseId, Contact, ContactId,
    GatewayError, NotificationTemplate, Registration, RegistrationId, SupportCase, TemplateId,
};

pub use outbox::{Outbox, OutboxEmail, OutboxEmailKind};

use parser::{AccountRow, CaseRow, ContactRow, RegistrationRow, SystemRuleRow};

pub const SYSTEM_RULES_FILE: &str = "system_rules.csv";
pub const ACCOUNTS_FILE: &str = "accounts.csv";
pub const CONTACTS_FILE: &str = "contacts.csv";
pub const CASES_FILE: &str = "cases.csv";
pub const REGISTRATIONS_FILE: &str = "registrations.csv";
pub const TEMPLATES_FILE: &str = "templates.json";

pub const RUN_DATE_RULE: &str = "date_to_run_registration_scheduled_task";
pub const TASK_OWNERS_RULE: &str = "registration_scheduled_task_owners";

const CANCELLATION_CASE_TITLE: &str = "Cancel one registration";
const REQUEST_CASE_TYPE_CODE: u32 = 3;
const OPEN_STATUS: &str = "Open";
const REGISTERED_SUB_STATUS: &str = "Registered";
const TEMPLATE_TITLE: &str = "Case Resolve: Cancel Registration";

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot directory {} does not exist", path.display())]
    MissingDirectory { path: PathBuf },
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid JSON data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Handle on the snapshot and outbox directories. Opened once per process and lent to the
/// adapters that read from or write to it.
#[derive(Debug)]
pub struct SnapshotConnection {
    data_dir: PathBuf,
    outbox_dir: PathBuf,
    actor_id: String,
}

impl SnapshotConnection {
    /// Opens the snapshot for a run, creating the outbox directory if needed.
    pub fn open(config: &StoreConfig) -> Result<Self, SnapshotError> {
        let connection = Self::open_read_only(config)?;
        std::fs::create_dir_all(&connection.outbox_dir)?;
        Ok(connection)
    }

    /// Opens the snapshot without touching the outbox. Journal writes through an [`Outbox`] on
    /// this connection fail if the outbox directory does not exist yet.
    pub fn open_read_only(config: &StoreConfig) -> Result<Self, SnapshotError> {
        if !config.data_dir.is_dir() {
            return Err(SnapshotError::MissingDirectory {
                path: config.data_dir.clone(),
            });
        }

        info!(
            data_dir = %config.data_dir.display(),
            outbox_dir = %config.outbox_dir.display(),
            "opened record snapshot"
        );

        Ok(Self {
            data_dir: config.data_dir.clone(),
            outbox_dir: config.outbox_dir.clone(),
            actor_id: config.actor_id.clone(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn outbox_dir(&self) -> &Path {
        &self.outbox_dir
    }

    /// Identity stamped on every mutation and used as the sender of every email.
    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }
}

/// Read side of the snapshot. Applies the eligibility filters so the reconciliation core only
/// ever sees candidate records.
pub struct SnapshotSource<'a> {
    connection: &'a SnapshotConnection,
}

impl<'a> SnapshotSource<'a> {
    pub fn new(connection: &'a SnapshotConnection) -> Self {
        Self { connection }
    }

    fn rule(&self, slug: &str) -> Result<Option<String>, SnapshotError> {
        let rows: Vec<SystemRuleRow> =
            parser::read_csv(&self.connection.path(SYSTEM_RULES_FILE))?;
        Ok(rows
            .into_iter()
            .find(|row| row.slug == slug)
            .and_then(|row| row.value))
    }

    fn registration_rows(&self) -> Option<Vec<RegistrationRow>> {
        logged(
            "registrations",
            parser::read_csv(&self.connection.path(REGISTRATIONS_FILE)),
        )
    }

    fn contacts_with_account(&self, registrations: &[RegistrationRow]) -> Option<Vec<Contact>> {
        info!("retrieving all contacts with related account");
        let accounts: Vec<AccountRow> =
            logged("accounts", parser::read_csv(&self.connection.path(ACCOUNTS_FILE)))?;
        let contacts: Vec<ContactRow> =
            logged("contacts", parser::read_csv(&self.connection.path(CONTACTS_FILE)))?;

        let registered_accounts: HashSet<&str> = registrations
            .iter()
            .filter_map(|row| row.account_id.as_deref())
            .collect();

        let mut seen = HashSet::new();
        let joined: Vec<Contact> = accounts
            .iter()
            .filter(|account| registered_accounts.contains(account.account_id.as_str()))
            .filter_map(|account| {
                let primary = account.primary_contact_id.as_deref()?;
                let contact = contacts.iter().find(|row| row.contact_id == primary)?;
                Some(Contact {
                    id: ContactId::new(contact.contact_id.clone()),
                    last_name: contact.last_name.clone(),
                    email: contact.email.clone(),
                    account: Some(Account {
                        id: AccountId::new(account.account_id.clone()),
                        name: account.name.clone(),
                        email: account.email.clone(),
                    }),
                })
            })
            .filter(|contact| {
                let account_id = contact.account.as_ref().map(|account| account.id.clone());
                seen.insert((contact.id.clone(), account_id))
            })
            .collect();

        info!(count = joined.len(), "retrieved contacts with related account");
        Some(joined)
    }

    fn cancellation_cases(&self) -> Option<Vec<SupportCase>> {
        info!("retrieving cancel one registration cases");
        let rows: Vec<CaseRow> =
            logged("cases", parser::read_csv(&self.connection.path(CASES_FILE)))?;

        let cases: Vec<SupportCase> = rows
            .into_iter()
            .filter(|row| {
                row.title == CANCELLATION_CASE_TITLE
                    && row.case_type_code == Some(REQUEST_CASE_TYPE_CODE)
            })
            .map(|row| SupportCase {
                id: CaseId::new(row.case_id),
                ticket_number: row.ticket_number,
                title: row.title,
                customer_id: ContactId::new(row.customer_id),
            })
            .collect();

        if cases.is_empty() {
            info!("no cancel one registration cases found");
            return None;
        }
        info!(count = cases.len(), "retrieved cancel one registration cases");
        Some(cases)
    }

    fn open_registrations(&self, rows: Vec<RegistrationRow>) -> Option<Vec<Registration>> {
        info!("retrieving registrations with status open and sub status registered");
        let registrations: Vec<Registration> = rows
            .into_iter()
            .filter(|row| row.status == OPEN_STATUS && row.sub_status == REGISTERED_SUB_STATUS)
            .filter_map(|row| {
                let account_id = row.account_id?;
                let Some(created_on) = parser::parse_timestamp(&row.created_on) else {
                    warn!(
                        registration_id = %row.registration_id,
                        created_on = %row.created_on,
                        "skipping registration with unreadable creation time"
                    );
                    return None;
                };
                Some(Registration {
                    id: RegistrationId::new(row.registration_id),
                    name: row.name,
                    account_id: AccountId::new(account_id),
                    priority: row.priority,
                    created_on,
                    status: row.status,
                    sub_status: row.sub_status,
                })
            })
            .collect();

        if registrations.is_empty() {
            info!("no registrations found with status open and sub status registered");
            return None;
        }
        info!(count = registrations.len(), "retrieved open registrations");
        Some(registrations)
    }

    fn template(&self) -> Option<NotificationTemplate> {
        info!(title = TEMPLATE_TITLE, "retrieving notification template by title");
        let records = logged(
            "templates",
            parser::read_templates(&self.connection.path(TEMPLATES_FILE)),
        )?;

        match records.into_iter().find(|record| record.title == TEMPLATE_TITLE) {
            Some(record) => {
                info!(template_id = %record.id, "retrieved notification template");
                Some(NotificationTemplate {
                    id: TemplateId::new(record.id),
                    title: record.title,
                    subject: record.subject,
                    body: record.body,
                })
            }
            None => {
                error!(title = TEMPLATE_TITLE, "no template found");
                None
            }
        }
    }

    fn task_owners(&self) -> Option<Vec<String>> {
        info!("retrieving email addresses of the registration scheduled task owners");
        match logged("system rules", self.rule(TASK_OWNERS_RULE))? {
            Some(value) => {
                let owners = split_recipients(&value);
                info!(count = owners.len(), "retrieved scheduled task owner emails");
                Some(owners)
            }
            None => {
                error!("registration scheduled task owners system rule value is empty");
                None
            }
        }
    }
}

impl CandidateSource for SnapshotSource<'_> {
    fn run_date(&self) -> Result<Option<String>, GatewayError> {
        info!("retrieving date to run registration scheduled task");
        self.rule(RUN_DATE_RULE)
            .map_err(|err| GatewayError::Unavailable(err.to_string()))
    }

    fn candidates(&self) -> CandidateSet {
        let registration_rows = self.registration_rows();
        let contacts = registration_rows
            .as_deref()
            .and_then(|rows| self.contacts_with_account(rows));

        CandidateSet {
            contacts,
            cases: self.cancellation_cases(),
            registrations: registration_rows.and_then(|rows| self.open_registrations(rows)),
            template: self.template(),
            recipients: self.task_owners(),
        }
    }
}

/// Owner list as stored in the system rule: comma separated, blanks dropped.
pub fn split_recipients(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn logged<T>(what: &str, result: Result<T, SnapshotError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!(input = what, error = %err, "failed to read snapshot input");
            None
        }
    }
}
