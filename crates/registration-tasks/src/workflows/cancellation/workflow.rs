use chrono::NaiveDateTime;
use tracing::{error, info, warn};

use super::domain::{
    Account, AccountId, CaseResolution, Contact, ContactId, NotificationTemplate,
    Registration, RegistrationId, RegistrationStatusChange, SupportCase,
};
use super::ledger::{IssueRecord, OutcomeLedger, SuccessRecord};
use super::matcher::select_registration;
use super::notification::render_notification;
use super::ports::{CaseStore, GatewayError, NotificationComposer, RegistrationStore};

/// The three side effects applied to every matched case, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowStep {
    CancelRegistration,
    ResolveCase,
    NotifyContact,
}

impl WorkflowStep {
    pub const fn ordered() -> [Self; 3] {
        [Self::CancelRegistration, Self::ResolveCase, Self::NotifyContact]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::CancelRegistration => "cancel registration",
            Self::ResolveCase => "resolve case",
            Self::NotifyContact => "notify contact",
        }
    }

    /// Text stored on the issue raised when this step fails.
    pub const fn issue_description(self) -> &'static str {
        match self {
            Self::CancelRegistration => "Update was not successful",
            Self::ResolveCase => "Case was not resolved successfully",
            Self::NotifyContact => "Email not created successfully",
        }
    }
}

/// Result of one attempted step.
#[derive(Debug)]
pub struct StepReport {
    pub step: WorkflowStep,
    pub result: Result<(), GatewayError>,
}

impl StepReport {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// What happened to one (contact, case) pair.
#[derive(Debug)]
pub enum CaseOutcome {
    /// The account owns no eligible registration; nothing was attempted.
    NoRegistration { account_id: AccountId },
    Processed {
        registration_id: RegistrationId,
        steps: [StepReport; 3],
        recorded_success: bool,
    },
}

impl CaseOutcome {
    pub fn failed_steps(&self) -> Vec<WorkflowStep> {
        match self {
            Self::NoRegistration { .. } => Vec::new(),
            Self::Processed { steps, .. } => steps
                .iter()
                .filter(|report| !report.succeeded())
                .map(|report| report.step)
                .collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("contact {contact_id} has no related account")]
    MissingAccount { contact_id: ContactId },
}

/// Complete inputs for the contact loop.
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationInput<'a> {
    pub contacts: &'a [Contact],
    pub cases: &'a [SupportCase],
    pub registrations: &'a [Registration],
    pub template: &'a NotificationTemplate,
}

/// Cancel, resolve and notify for a single matched case. Every step is attempted regardless of
/// how the previous one went.
pub struct CaseWorkflow<'a> {
    registrations: &'a dyn RegistrationStore,
    cases: &'a dyn CaseStore,
    notifications: &'a dyn NotificationComposer,
    actor: &'a str,
}

impl<'a> CaseWorkflow<'a> {
    pub fn new(
        registrations: &'a dyn RegistrationStore,
        cases: &'a dyn CaseStore,
        notifications: &'a dyn NotificationComposer,
        actor: &'a str,
    ) -> Self {
        Self {
            registrations,
            cases,
            notifications,
            actor,
        }
    }

    pub fn process_case(
        &self,
        contact: &Contact,
        account: &Account,
        case: &SupportCase,
        input: &ReconciliationInput<'_>,
        now: NaiveDateTime,
        ledger: &mut OutcomeLedger,
    ) -> CaseOutcome {
        info!(account_id = %account.id, "filtering registrations related to account");
        let Some(registration) = select_registration(&account.id, input.registrations) else {
            error!(
                account = %account.name,
                account_id = %account.id,
                "no registration found for account"
            );
            return CaseOutcome::NoRegistration {
                account_id: account.id.clone(),
            };
        };

        info!(
            registration = %registration.name,
            case = %case.title,
            "retrieved registration for case"
        );

        let cancel = self.attempt(
            WorkflowStep::CancelRegistration,
            account,
            registration,
            ledger,
            || {
                let change =
                    RegistrationStatusChange::cancelled_by_task(registration, self.actor, now);
                self.registrations.apply_status(&change)
            },
        );
        let resolve = self.attempt(
            WorkflowStep::ResolveCase,
            account,
            registration,
            ledger,
            || self.cases.resolve(&CaseResolution::resolved(case, now)),
        );
        let notify = self.attempt(
            WorkflowStep::NotifyContact,
            account,
            registration,
            ledger,
            || {
                let notification = render_notification(
                    input.template,
                    contact,
                    case,
                    registration,
                    self.actor,
                    now,
                );
                self.notifications
                    .create(&notification)
                    .map(|email_id| info!(%email_id, "created notification email"))
            },
        );

        // Only issues recorded up to this point count; a later case for the same account can
        // still add issues after this success is recorded.
        let recorded_success = !ledger.has_issue_for(&account.name);
        if recorded_success {
            ledger.record_success(SuccessRecord {
                account_name: account.name.clone(),
                registration_name: registration.name.clone(),
                case_name: case.title.clone(),
            });
        }

        CaseOutcome::Processed {
            registration_id: registration.id.clone(),
            steps: [cancel, resolve, notify],
            recorded_success,
        }
    }

    fn attempt(
        &self,
        step: WorkflowStep,
        account: &Account,
        registration: &Registration,
        ledger: &mut OutcomeLedger,
        action: impl FnOnce() -> Result<(), GatewayError>,
    ) -> StepReport {
        let result = action();
        if let Err(err) = &result {
            warn!(
                step = step.label(),
                registration = %registration.name,
                error = %err,
                "workflow step failed"
            );
            ledger.record_issue(IssueRecord {
                account_name: account.name.clone(),
                registration_name: registration.name.clone(),
                description: step.issue_description().to_string(),
            });
        }
        StepReport { step, result }
    }
}

/// Walks every contact and its cases, folding each pair into the ledger. A failure stays inside
/// the contact it belongs to.
pub struct ReconciliationTask<'a> {
    workflow: CaseWorkflow<'a>,
}

impl<'a> ReconciliationTask<'a> {
    pub fn new(workflow: CaseWorkflow<'a>) -> Self {
        Self { workflow }
    }

    pub fn execute(&self, input: &ReconciliationInput<'_>, now: NaiveDateTime) -> OutcomeLedger {
        input
            .contacts
            .iter()
            .fold(OutcomeLedger::new(), |mut ledger, contact| {
                if let Err(err) = self.process_contact(contact, input, now, &mut ledger) {
                    error!(contact_id = %contact.id, error = %err, "contact processing failed");
                }
                ledger
            })
    }

    fn process_contact(
        &self,
        contact: &Contact,
        input: &ReconciliationInput<'_>,
        now: NaiveDateTime,
        ledger: &mut OutcomeLedger,
    ) -> Result<(), ContactError> {
        let account = contact
            .account
            .as_ref()
            .ok_or_else(|| ContactError::MissingAccount {
                contact_id: contact.id.clone(),
            })?;

        info!(
            contact_id = %contact.id,
            last_name = %contact.last_name,
            "filtering cases related to contact"
        );
        let cases: Vec<&SupportCase> = input
            .cases
            .iter()
            .filter(|case| case.customer_id == contact.id)
            .collect();
        info!(contact_id = %contact.id, count = cases.len(), "retrieved cases for contact");

        for case in cases {
            let outcome = self
                .workflow
                .process_case(contact, account, case, input, now, ledger);
            let failed = outcome.failed_steps();
            if !failed.is_empty() {
                warn!(
                    case_id = %case.id,
                    failed_steps = failed.len(),
                    "case processed with issues"
                );
            }
        }

        Ok(())
    }
}
