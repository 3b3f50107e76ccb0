use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};

use crate::workflows::cancellation::domain::{
    Account, AccountId, CaseId, CaseResolution, Contact, ContactId, NotificationTemplate,
    Registration, RegistrationId, RegistrationStatusChange, SupportCase, TemplateId,
};
use crate::workflows::cancellation::ledger::{IssueRecord, SuccessRecord};
use crate::workflows::cancellation::ports::{
    CandidateSet, CandidateSource, CaseStore, ContactNotification, GatewayError,
    NotificationComposer, RegistrationStore, SummaryDispatcher,
};
use crate::workflows::cancellation::workflow::{
    CaseWorkflow, ReconciliationInput, ReconciliationTask,
};

pub(super) const ACTOR: &str = "svc-registration-task";

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
}

pub(super) fn now() -> NaiveDateTime {
    today().and_hms_opt(6, 30, 0).expect("valid time")
}

pub(super) fn created(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid date")
        .and_hms_opt(9, 0, 0)
        .expect("valid time")
}

pub(super) fn account(id: &str, name: &str) -> Account {
    Account {
        id: AccountId::new(id),
        name: name.to_string(),
        email: Some(format!("{id}@accounts.example")),
    }
}

pub(super) fn contact(id: &str, last_name: &str, account: Option<Account>) -> Contact {
    Contact {
        id: ContactId::new(id),
        last_name: last_name.to_string(),
        email: Some(format!("{id}@contacts.example")),
        account,
    }
}

pub(super) fn case(id: &str, ticket_number: &str, customer: &str) -> SupportCase {
    SupportCase {
        id: CaseId::new(id),
        ticket_number: ticket_number.to_string(),
        title: "Cancel one registration".to_string(),
        customer_id: ContactId::new(customer),
    }
}

pub(super) fn registration(
    id: &str,
    name: &str,
    account_id: &str,
    priority: i32,
    created_on: NaiveDateTime,
) -> Registration {
    Registration {
        id: RegistrationId::new(id),
        name: name.to_string(),
        account_id: AccountId::new(account_id),
        priority,
        created_on,
        status: "Open".to_string(),
        sub_status: "Registered".to_string(),
    }
}

pub(super) fn spring_league() -> Registration {
    registration("reg-1", "Spring League", "acc-1", 1, created(2026, 1, 1))
}

pub(super) fn template() -> NotificationTemplate {
    NotificationTemplate {
        id: TemplateId::new("tpl-1"),
        title: "Case Resolve: Cancel Registration".to_string(),
        subject: "Your #caseNumber# request".to_string(),
        body: "Dear #LastName#, case #caseNumber# cancelled #RegistrationName#.".to_string(),
    }
}

#[derive(Default)]
pub(super) struct FakeRegistrations {
    pub(super) applied: Mutex<Vec<RegistrationStatusChange>>,
    pub(super) failing: HashSet<RegistrationId>,
}

impl FakeRegistrations {
    pub(super) fn applied(&self) -> Vec<RegistrationStatusChange> {
        self.applied.lock().expect("registration mutex").clone()
    }
}

impl RegistrationStore for FakeRegistrations {
    fn apply_status(&self, change: &RegistrationStatusChange) -> Result<(), GatewayError> {
        self.applied
            .lock()
            .expect("registration mutex")
            .push(change.clone());
        if self.failing.contains(&change.registration_id) {
            return Err(GatewayError::Rejected("registration locked".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct FakeCases {
    pub(super) resolved: Mutex<Vec<CaseResolution>>,
    pub(super) failing: HashSet<CaseId>,
}

impl FakeCases {
    pub(super) fn resolved(&self) -> Vec<CaseResolution> {
        self.resolved.lock().expect("case mutex").clone()
    }
}

impl CaseStore for FakeCases {
    fn resolve(&self, resolution: &CaseResolution) -> Result<(), GatewayError> {
        self.resolved
            .lock()
            .expect("case mutex")
            .push(resolution.clone());
        if self.failing.contains(&resolution.case_id) {
            return Err(GatewayError::Rejected("case already closed".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct FakeComposer {
    pub(super) created: Mutex<Vec<ContactNotification>>,
    pub(super) failing: HashSet<ContactId>,
}

impl FakeComposer {
    pub(super) fn created(&self) -> Vec<ContactNotification> {
        self.created.lock().expect("composer mutex").clone()
    }
}

impl NotificationComposer for FakeComposer {
    fn create(&self, notification: &ContactNotification) -> Result<String, GatewayError> {
        let mut guard = self.created.lock().expect("composer mutex");
        guard.push(notification.clone());
        if self.failing.contains(&notification.to_contact) {
            return Err(GatewayError::Unavailable("mail store offline".to_string()));
        }
        Ok(format!("email-{}", guard.len()))
    }
}

#[derive(Default)]
pub(super) struct FakeDispatcher {
    pub(super) sent: Mutex<Vec<(String, usize, usize)>>,
    pub(super) sent_on: Mutex<Vec<NaiveDateTime>>,
    pub(super) failing: HashSet<String>,
}

impl FakeDispatcher {
    pub(super) fn sent(&self) -> Vec<(String, usize, usize)> {
        self.sent.lock().expect("dispatcher mutex").clone()
    }

    pub(super) fn sent_on(&self) -> Vec<NaiveDateTime> {
        self.sent_on.lock().expect("dispatcher mutex").clone()
    }
}

impl SummaryDispatcher for FakeDispatcher {
    fn send(
        &self,
        recipient: &str,
        successes: &[SuccessRecord],
        issues: &[IssueRecord],
        sent_on: NaiveDateTime,
    ) -> Result<(), GatewayError> {
        self.sent_on.lock().expect("dispatcher mutex").push(sent_on);
        self.sent.lock().expect("dispatcher mutex").push((
            recipient.to_string(),
            successes.len(),
            issues.len(),
        ));
        if self.failing.contains(recipient) {
            return Err(GatewayError::Unavailable("smtp relay refused".to_string()));
        }
        Ok(())
    }
}

pub(super) struct FakeSource {
    pub(super) run_date: Result<Option<String>, String>,
    pub(super) candidates: CandidateSet,
}

impl FakeSource {
    pub(super) fn scheduled_today(candidates: CandidateSet) -> Self {
        Self {
            run_date: Ok(Some(today().format("%m-%d-%Y").to_string())),
            candidates,
        }
    }
}

impl CandidateSource for FakeSource {
    fn run_date(&self) -> Result<Option<String>, GatewayError> {
        self.run_date
            .clone()
            .map_err(GatewayError::Unavailable)
    }

    fn candidates(&self) -> CandidateSet {
        self.candidates.clone()
    }
}

/// Fake collaborators for one run.
#[derive(Default)]
pub(super) struct Harness {
    pub(super) registrations: FakeRegistrations,
    pub(super) cases: FakeCases,
    pub(super) composer: FakeComposer,
    pub(super) dispatcher: FakeDispatcher,
}

impl Harness {
    pub(super) fn task(&self) -> ReconciliationTask<'_> {
        ReconciliationTask::new(CaseWorkflow::new(
            &self.registrations,
            &self.cases,
            &self.composer,
            ACTOR,
        ))
    }
}

pub(super) fn input<'a>(
    contacts: &'a [Contact],
    cases: &'a [SupportCase],
    registrations: &'a [Registration],
    template: &'a NotificationTemplate,
) -> ReconciliationInput<'a> {
    ReconciliationInput {
        contacts,
        cases,
        registrations,
        template,
    }
}

/// One account "Northwind" (contact c-1) with a single case and registration.
pub(super) fn single_pair_set() -> CandidateSet {
    let northwind = account("acc-1", "Northwind");
    CandidateSet {
        contacts: Some(vec![contact("c-1", "Okafor", Some(northwind))]),
        cases: Some(vec![case("case-1", "CAS-0001", "c-1")]),
        registrations: Some(vec![spring_league()]),
        template: Some(template()),
        recipients: Some(vec![
            "owner1@example.com".to_string(),
            "owner2@example.com".to_string(),
        ]),
    }
}
