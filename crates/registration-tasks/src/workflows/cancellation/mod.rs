//! Daily reconciliation of "cancel one registration" support cases.
//!
//! Each open case is paired with the account's active registration, the registration is
//! cancelled, the case resolved and the contact notified. Step failures become issues in the
//! run's ledger instead of aborting the run, and the ledger is mailed to the task owners at the
//! end.

pub mod domain;
mod engine;
pub mod gate;
mod ledger;
mod matcher;
mod notification;
pub mod ports;
pub mod report;
mod workflow;

#[cfg(test)]
mod tests;

pub use domain::{
    Account, AccountId, CaseId, CaseResolution, Contact, ContactId, NotificationTemplate,
    Registration, RegistrationId, RegistrationStatusChange, SupportCase, TemplateId,
};
pub use engine::{
    DeliveryOutcome, MissingInput, RegistrationTaskEngine, RunOutcome, RunReport, SkipReason,
};
pub use gate::{parse_run_date, should_run, GateDecision};
pub use ledger::{IssueRecord, OutcomeLedger, SuccessRecord};
pub use matcher::select_registration;
pub use notification::render_notification;
pub use ports::{
    CandidateSet, CandidateSource, CaseStore, ContactNotification, GatewayError,
    NotificationComposer, RegistrationStore, SummaryDispatcher,
};
pub use report::{render_summary_html, SUMMARY_SUBJECT};
pub use workflow::{
    CaseOutcome, CaseWorkflow, ContactError, ReconciliationInput, ReconciliationTask,
    StepReport, WorkflowStep,
};
